//! Mass totals, mise-en-place time and nutrition estimates

use gram_core::config::meta_number;
use gram_core::document::Meta;
use indexmap::IndexSet;

use crate::ingredients::{IngredientSource, Macros};
use crate::model::{
    MassMetrics, MassStatus, Modifier, Nutrition, Registry, Section, StepBlock, StepContent,
    Usage, round2,
};

/// Minutes per registered ingredient or cookware
const PREP_PER_ITEM: u32 = 1;
/// Minutes per usage with a preparation note
const PREP_PER_NOTE: u32 = 2;

/// Mass totals over ingredient usages.
///
/// Alternatives count as their first option. Ghost formulas count as missing.
pub fn mass_metrics<'a>(usages: impl IntoIterator<Item = &'a Usage>) -> MassMetrics {
    let mut total = 0.0;
    let mut any_estimate = false;
    let mut missing = IndexSet::new();

    for usage in usages.into_iter().filter_map(Usage::counted_ingredient) {
        match usage.known_mass() {
            Some(mass) => {
                total += mass.mass;
                any_estimate |= mass.is_estimate;
            }
            None => {
                missing.insert(usage.name.clone());
            }
        }
    }

    let mass_status = if !missing.is_empty() {
        MassStatus::Incomplete
    } else if any_estimate {
        MassStatus::Estimated
    } else {
        MassStatus::Precise
    };

    MassMetrics {
        total_mass: round2(total),
        mass_status,
        missing_mass_ingredients: missing.into_iter().collect(),
    }
}

/// Non-reference ingredient usages of every section
pub fn counted_usages(sections: &[Section]) -> impl Iterator<Item = &Usage> {
    sections
        .iter()
        .flat_map(|section| &section.ingredients)
        .filter(|usage| {
            usage
                .counted_ingredient()
                .is_none_or(|item| !item.has_modifier(&Modifier::Reference))
        })
}

/// Mise-en-place estimate in minutes
pub fn preparation_time(registry: &Registry, sections: &[Section]) -> u32 {
    fn prep_cost(usage: &Usage) -> u32 {
        match usage {
            Usage::Ingredient(item) if item.preparation.is_some() => PREP_PER_NOTE,
            Usage::Alternative(alt) => alt.options.iter().map(prep_cost).max().unwrap_or(0),
            _ => 0,
        }
    }

    let base = (registry.ingredients.len() + registry.cookware.len()) as u32 * PREP_PER_ITEM;
    let notes: u32 = sections
        .iter()
        .flat_map(|section| &section.steps)
        .filter_map(|block| match block {
            StepBlock::Step(step) => Some(step),
            StepBlock::Comment(_) => None,
        })
        .flat_map(|step| &step.content)
        .filter_map(|content| match content {
            StepContent::Usage(usage) => Some(prep_cost(usage)),
            StepContent::Text(_) => None,
        })
        .sum();

    base + notes
}

/// Best-effort nutrition over the counted usages.
///
/// Returns `None` when nothing could be counted.
pub fn nutrition<'a>(
    usages: impl IntoIterator<Item = &'a Usage>,
    source: &dyn IngredientSource,
    meta: &Meta,
) -> Option<Nutrition> {
    let mut total = Macros::default();
    let mut counted = 0usize;
    let mut known = 0usize;

    for usage in usages.into_iter().filter_map(Usage::counted_ingredient) {
        counted += 1;
        let Some(mass) = usage.known_mass().map(|m| m.mass).filter(|m| *m > 0.0) else {
            continue;
        };
        let Some(per_100g) = source.lookup(&usage.name).and_then(|data| data.macros) else {
            continue;
        };

        known += 1;
        let factor = mass / 100.0;
        total.calories += per_100g.calories * factor;
        total.protein += per_100g.protein * factor;
        total.carbs += per_100g.carbs * factor;
        total.fat += per_100g.fat * factor;
    }

    if counted == 0 {
        return None;
    }

    let portions = ["servings", "portions"]
        .iter()
        .find_map(|key| meta_number(meta, key))
        .unwrap_or(1.0);

    tracing::debug!("Nutrition: {}/{} usages with macros", known, counted);

    Some(Nutrition {
        total: rounded(total, 1.0),
        per_portion: (portions > 1.0).then(|| rounded(total, portions)),
        is_estimate: true,
        coverage: round2(known as f64 / counted as f64),
    })
}

fn rounded(macros: Macros, portions: f64) -> Macros {
    let tenth = |n: f64| (n / portions * 10.0).round() / 10.0;
    Macros {
        calories: (macros.calories / portions).round(),
        protein: tenth(macros.protein),
        carbs: tenth(macros.carbs),
        fat: tenth(macros.fat),
    }
}
