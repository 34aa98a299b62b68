//! Per-compile state
//!
//! [`ScopeState`] tracks what has been declared so far; [`Schedule`] tracks
//! the cook timeline. Both are created fresh for every compile and threaded
//! through section compilation.

use std::collections::{HashMap, HashSet};

use crate::model::{Timings, VariableWeight};

/// Minutes charged to a step with no timer at all
pub const DEFAULT_STEP_MINUTES: f64 = 2.0;

/// Declarations visible to the item being resolved
#[derive(Debug, Default)]
pub struct ScopeState {
    /// Identity of the preparation the current step declares
    pub open_intermediate: Option<String>,

    /// Ingredient display names seen so far
    pub seen_names: HashSet<String>,

    /// Intermediate names declared so far
    pub defined_intermediates: HashSet<String>,

    /// Intermediate names referenced after their declaration
    pub used_intermediates: HashSet<String>,

    /// Preparation masses by identity
    pub variable_weights: HashMap<String, VariableWeight>,

    /// Intermediate name → title of the section that declared it
    pub declaring_sections: HashMap<String, Option<String>>,
}

impl ScopeState {
    /// Record a preparation mass, replacing any earlier figure
    pub fn set_weight(&mut self, id: &str, mass: f64, is_partial: bool) {
        tracing::debug!("Preparation '{}' weighs {} g (partial: {})", id, mass, is_partial);
        self.variable_weights
            .insert(id.to_string(), VariableWeight { mass, is_partial });
    }

    /// Mark an intermediate as used if it has been declared
    pub fn note_use(&mut self, name: &str) {
        if self.defined_intermediates.contains(name) {
            self.used_intermediates.insert(name.to_string());
        }
    }
}

/// The cook timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Minutes elapsed on the cook's own timeline
    pub cursor: f64,

    /// Sum of every step's active time
    pub active_time: f64,

    /// Absolute end of every background task
    pub background_ends: Vec<f64>,
}

impl Schedule {
    /// Register a background task starting `start_offset` minutes into the
    /// current step
    pub fn start_background(&mut self, start_offset: f64, duration: f64) {
        self.background_ends.push(self.cursor + start_offset + duration);
    }

    /// Close the current step and advance the cursor.
    ///
    /// `has_background` keeps steps that only start background timers at zero
    /// active minutes.
    pub fn finish_step(&mut self, local_active: f64, has_background: bool) -> Timings {
        let active = if local_active == 0.0 && !has_background {
            DEFAULT_STEP_MINUTES
        } else {
            local_active
        };

        let timings = Timings {
            start: self.cursor,
            end: self.cursor + active,
            active_duration: active,
        };
        self.cursor += active;
        self.active_time += active;
        timings
    }

    /// Critical path: the cursor or the last background task, whichever ends later
    pub fn total_time(&self) -> f64 {
        self.background_ends
            .iter()
            .copied()
            .fold(self.cursor, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untimed_step_takes_default() {
        let mut schedule = Schedule::default();
        let timings = schedule.finish_step(0.0, false);
        assert_eq!(timings.start, 0.0);
        assert_eq!(timings.end, DEFAULT_STEP_MINUTES);
        assert_eq!(schedule.cursor, DEFAULT_STEP_MINUTES);
    }

    #[test]
    fn test_background_only_step_is_instant() {
        let mut schedule = Schedule::default();
        schedule.start_background(0.0, 60.0);
        let timings = schedule.finish_step(0.0, true);
        assert_eq!(timings.active_duration, 0.0);
        assert_eq!(schedule.total_time(), 60.0);
    }

    #[test]
    fn test_critical_path() {
        let mut schedule = Schedule::default();
        schedule.finish_step(10.0, false);
        // Starts 5 minutes into the second step, at minute 15
        schedule.start_background(5.0, 30.0);
        schedule.finish_step(5.0, true);
        schedule.finish_step(0.0, false);

        assert_eq!(schedule.cursor, 17.0);
        assert_eq!(schedule.active_time, 17.0);
        assert_eq!(schedule.total_time(), 45.0);
    }

    #[test]
    fn test_weights_are_replaced() {
        let mut scope = ScopeState::default();
        scope.set_weight("dough", 500.0, true);
        scope.set_weight("dough", 800.0, false);
        assert_eq!(
            scope.variable_weights["dough"],
            VariableWeight {
                mass: 800.0,
                is_partial: false
            }
        );
    }

    #[test]
    fn test_note_use_requires_declaration() {
        let mut scope = ScopeState::default();
        scope.note_use("dough");
        assert!(scope.used_intermediates.is_empty());

        scope.defined_intermediates.insert("dough".into());
        scope.note_use("dough");
        assert!(scope.used_intermediates.contains("dough"));
    }
}
