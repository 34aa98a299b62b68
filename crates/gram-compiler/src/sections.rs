//! Section compiler
//!
//! Walks the document tree in order, resolving every step item (see
//! [`crate::resolve`]) and laying steps out on the cook timeline.
//!
//! ```text
//! Recipe ─▶ Section ─▶ Step ─▶ Item ──resolve──▶ Usage
//!             │          │                         │
//!             │          └── timers ─▶ Schedule    └─▶ section lists
//!             └── intermediate ─▶ VariableWeight
//! ```

use gram_core::document::{Block, SectionNode, StepNode};
use gram_core::slugify;

use crate::mass::Normalizer;
use crate::model::{
    BackgroundTask, ConversionMethod, ItemUsage, Registry, Section, Step, StepBlock, StepContent,
    TimerUsage, Usage, Warning, WarningCode, display_value,
};
use crate::resolve::{Resolved, SectionLists};
use crate::scope::{Schedule, ScopeState};
use crate::units::to_minutes;

/// Label for unnamed background timers
const DEFAULT_TASK_NAME: &str = "Timer";

/// Everything the section pass produces
#[derive(Debug)]
pub struct CompiledSections {
    /// Compiled sections in document order
    pub sections: Vec<Section>,
    /// Registry built along the way
    pub registry: Registry,
    /// Diagnostics in the order they were raised
    pub warnings: Vec<Warning>,
    /// Final cook timeline
    pub schedule: Schedule,
}

/// Compile the root's children.
///
/// When the first child is not a section, all children are wrapped in one
/// untitled section.
pub fn compile_sections(blocks: &[Block], normalizer: Normalizer<'_>) -> CompiledSections {
    let mut compiler = SectionCompiler::new(normalizer);

    let wrapped;
    let blocks = match blocks.first() {
        None | Some(Block::Section(_)) => blocks,
        Some(_) => {
            wrapped = [Block::Section(SectionNode {
                title: None,
                retro_planning: None,
                intermediate_decl: None,
                children: blocks.to_vec(),
            })];
            &wrapped[..]
        }
    };

    let mut sections = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            Block::Section(node) => sections.push(compiler.compile_section(node)),
            Block::Step(_) | Block::Comment(_) => {
                tracing::debug!("Skipping block outside any section")
            }
        }
    }

    CompiledSections {
        sections,
        registry: compiler.registry,
        warnings: compiler.warnings,
        schedule: compiler.schedule,
    }
}

/// Mutable state of one section pass
pub(crate) struct SectionCompiler<'a> {
    pub(crate) registry: Registry,
    pub(crate) scope: ScopeState,
    pub(crate) schedule: Schedule,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) normalizer: Normalizer<'a>,
}

impl<'a> SectionCompiler<'a> {
    fn new(normalizer: Normalizer<'a>) -> Self {
        Self {
            registry: Registry::default(),
            scope: ScopeState::default(),
            schedule: Schedule::default(),
            warnings: Vec::new(),
            normalizer,
        }
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        tracing::debug!(code = ?warning.code, "{}", warning.message);
        self.warnings.push(warning);
    }

    fn compile_section(&mut self, node: &SectionNode) -> Section {
        if let Some(decl) = &node.intermediate_decl {
            self.declare_section_intermediate(&decl.name, node.title.as_deref());
        }

        let mut lists = SectionLists::default();
        let mut steps = Vec::with_capacity(node.children.len());
        for block in &node.children {
            match block {
                Block::Step(step) => steps.push(StepBlock::Step(self.compile_step(step, &mut lists))),
                Block::Comment(comment) => steps.push(StepBlock::Comment(comment.clone())),
                Block::Section(nested) => {
                    tracing::debug!("Skipping nested section {:?}", nested.title)
                }
            }
        }

        let intermediate_preparation = node.intermediate_decl.as_ref().map(|d| d.name.clone());
        if let Some(name) = &intermediate_preparation {
            // Section totals supersede whatever its steps recorded
            let (mass, is_partial) = list_mass(&lists.ingredients);
            self.scope.set_weight(&slugify(name), mass, is_partial);
        }

        Section {
            title: node.title.clone(),
            ingredients: lists.ingredients,
            cookware: lists.cookware,
            steps,
            intermediate_preparation,
            retro_planning: node.retro_planning.clone(),
            metrics: None,
        }
    }

    fn declare_section_intermediate(&mut self, name: &str, title: Option<&str>) {
        if self.scope.declaring_sections.contains_key(name) {
            self.warn(Warning::section(
                WarningCode::ScopeConflict,
                format!("Intermediate '&{}' is redeclared", name),
                title.map(str::to_string),
            ));
        } else {
            self.scope
                .declaring_sections
                .insert(name.to_string(), title.map(str::to_string));
        }

        let id = slugify(name);
        self.registry.intern_ingredient(&id, name, None).is_intermediate = true;
        self.scope.defined_intermediates.insert(name.to_string());
    }

    fn compile_step(&mut self, node: &StepNode, lists: &mut SectionLists) -> Step {
        self.scope.open_intermediate = None;

        let mut text = String::new();
        let mut content = Vec::with_capacity(node.children.len());
        let mut local_active = 0.0;
        let mut background_tasks = Vec::new();

        for item in &node.children {
            match self.resolve_item(item, lists) {
                Resolved::Text(value) => {
                    text.push_str(&value);
                    content.push(StepContent::Text(value));
                }
                Resolved::Usage(usage) => {
                    text.push_str(&render_usage(&usage));
                    if let Usage::Timer(timer) = &usage
                        && let Some(duration) = timer_minutes(timer)
                    {
                        if timer.is_async {
                            self.schedule.start_background(local_active, duration);
                            background_tasks.push(BackgroundTask {
                                name: timer
                                    .name
                                    .clone()
                                    .unwrap_or_else(|| DEFAULT_TASK_NAME.to_string()),
                                duration,
                                start_offset: local_active,
                            });
                        } else {
                            local_active += duration;
                        }
                    }
                    content.push(StepContent::Usage(usage));
                }
                Resolved::Nothing => {}
            }
        }

        let timings = self
            .schedule
            .finish_step(local_active, !background_tasks.is_empty());

        let intermediate_preparation = self.scope.open_intermediate.take();
        if let Some(id) = &intermediate_preparation {
            let (mass, is_partial) = step_mass(&content);
            self.scope.set_weight(id, mass, is_partial);
        }

        Step {
            value: text.trim().to_string(),
            action: node.action.clone(),
            content,
            timings,
            background_tasks,
            intermediate_preparation,
        }
    }
}

fn timer_minutes(timer: &TimerUsage) -> Option<f64> {
    let amount = timer.quantity.as_ref()?.number()?;
    Some(to_minutes(amount, timer.unit.as_deref()))
}

/// Sum of known masses over section list entries; partial if any is missing
fn list_mass(usages: &[Usage]) -> (f64, bool) {
    let mut total = 0.0;
    let mut is_partial = false;
    for usage in usages {
        match usage.counted_ingredient().and_then(ItemUsage::known_mass) {
            Some(mass) => total += mass.mass,
            None => is_partial = true,
        }
    }
    (total, is_partial)
}

/// Sum of ingredient and reference masses in a step
fn step_mass(content: &[StepContent]) -> (f64, bool) {
    let mut total = 0.0;
    let mut is_partial = false;

    for item in content {
        let StepContent::Usage(usage) = item else {
            continue;
        };
        let (mass, complete) = match usage {
            Usage::Ingredient(ingredient) => ingredient_mass(ingredient),
            Usage::Alternative(alt) => match alt.options.first() {
                Some(Usage::Ingredient(first)) => ingredient_mass(first),
                _ => continue,
            },
            // A partially weighed preparation still counts but taints the total
            Usage::Reference(reference) => match reference.mass {
                Some(mass) => (
                    mass.mass,
                    !(mass.method == ConversionMethod::Variable && mass.is_estimate),
                ),
                None => (0.0, false),
            },
            Usage::Cookware(_) | Usage::Timer(_) | Usage::Temperature(_) | Usage::Comment(_) => {
                continue;
            }
        };
        total += mass;
        is_partial |= !complete;
    }
    (total, is_partial)
}

fn ingredient_mass(usage: &ItemUsage) -> (f64, bool) {
    match usage.known_mass() {
        Some(mass) => (mass.mass, true),
        None => (0.0, false),
    }
}

/// Display form of a usage inside step text
fn render_usage(usage: &Usage) -> String {
    match usage {
        Usage::Ingredient(item) => format!("@{}", item.name),
        Usage::Cookware(item) => format!("#{}", item.name),
        Usage::Reference(reference) => format!("&{}", reference.name),
        Usage::Alternative(alt) => alt
            .options
            .iter()
            .map(render_usage)
            .collect::<Vec<_>>()
            .join("|"),
        Usage::Timer(timer) => {
            let mut rendered = format!(
                "~{}{}",
                timer.name.as_deref().unwrap_or_default(),
                braces(timer.quantity.as_ref().map(display_value), timer.unit.as_deref())
            );
            if timer.is_async {
                rendered.push('&');
            }
            rendered
        }
        Usage::Temperature(temperature) => format!(
            "!{}{}",
            temperature.name.as_deref().unwrap_or_default(),
            braces(
                temperature.quantity.as_ref().map(display_value),
                temperature.unit.as_deref()
            )
        ),
        Usage::Comment(_) => String::new(),
    }
}

fn braces(quantity: Option<String>, unit: Option<&str>) -> String {
    match quantity {
        Some(quantity) => format!("{{{}{}}}", quantity, unit.unwrap_or_default()),
        None => String::new(),
    }
}
