//! Compiled recipe model
//!
//! Everything the compiler produces. The types serialize to the output JSON
//! shape directly; `null` fields and empty lists are pruned afterwards by
//! [`crate::output::sanitize`].

use gram_core::document::{CommentNode, Meta, QuantityValue};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::ingredients::Macros;
use crate::shopping::ShoppingItem;

// =============================================================================
// Registry
// =============================================================================

/// Canonical ingredient and cookware entries keyed by identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registry {
    /// Ingredients and intermediate preparations, in first-seen order
    pub ingredients: IndexMap<String, RegistryEntry>,

    /// Cookware, in first-seen order
    pub cookware: IndexMap<String, CookwareEntry>,
}

/// Registry entry for an ingredient or intermediate preparation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    /// Identity (slug of the display name)
    pub id: String,

    /// Display name as first seen
    pub name: String,

    /// First unit this ingredient was written with
    pub default_unit: Option<String>,

    /// Parent of composite parts, or a part itself
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_composite: bool,

    /// Parent identity for composite parts
    pub parent: Option<String>,

    /// Named intermediate preparation
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_intermediate: bool,
}

impl RegistryEntry {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            default_unit: None,
            is_composite: false,
            parent: None,
            is_intermediate: false,
        }
    }
}

/// Registry entry for cookware
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookwareEntry {
    /// Identity
    pub id: String,
    /// Display name as first seen
    pub name: String,
}

impl Registry {
    /// Fetch or create the ingredient entry for `id`.
    ///
    /// Entries only gain attributes: a default unit is recorded the first time
    /// one is seen and never replaced.
    pub fn intern_ingredient(&mut self, id: &str, name: &str, unit: Option<&str>) -> &mut RegistryEntry {
        let entry = self
            .ingredients
            .entry(id.to_string())
            .or_insert_with(|| RegistryEntry::new(id, name));
        if entry.default_unit.is_none() {
            entry.default_unit = unit.map(str::to_string);
        }
        entry
    }

    /// Fetch or create the cookware entry for `id`
    pub fn intern_cookware(&mut self, id: &str, name: &str) -> &mut CookwareEntry {
        self.cookware
            .entry(id.to_string())
            .or_insert_with(|| CookwareEntry {
                id: id.to_string(),
                name: name.to_string(),
            })
    }

    /// Whether an ingredient identity is known
    pub fn has_ingredient(&self, id: &str) -> bool {
        self.ingredients.contains_key(id)
    }

    /// Display name for an ingredient identity
    pub fn ingredient_name(&self, id: &str) -> Option<&str> {
        self.ingredients.get(id).map(|e| e.name.as_str())
    }
}

// =============================================================================
// Usages
// =============================================================================

/// One resolved occurrence of an item inside a step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Usage {
    /// Ingredient occurrence
    Ingredient(ItemUsage),
    /// Cookware occurrence
    Cookware(ItemUsage),
    /// Bare mention of an earlier ingredient or preparation
    Reference(ReferenceUsage),
    /// Mutually exclusive options
    Alternative(AlternativeUsage),
    /// Timer
    Timer(TimerUsage),
    /// Temperature
    Temperature(TemperatureUsage),
    /// Inline comment
    Comment(CommentNode),
}

impl Usage {
    /// The ingredient payload, if this is an ingredient
    pub fn as_ingredient(&self) -> Option<&ItemUsage> {
        match self {
            Usage::Ingredient(usage) => Some(usage),
            _ => None,
        }
    }

    /// The ingredient this usage stands for in totals.
    ///
    /// Alternatives count as their first option.
    pub fn counted_ingredient(&self) -> Option<&ItemUsage> {
        match self {
            Usage::Ingredient(usage) => Some(usage),
            Usage::Alternative(alt) => alt.options.first().and_then(Usage::as_ingredient),
            _ => None,
        }
    }
}

/// Ingredient or cookware usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemUsage {
    /// Identity
    pub id: String,

    /// Display name
    pub name: String,

    /// Quantity as written (or as resolved for relative quantities)
    pub qty: Option<Amount>,

    /// Unit as written
    pub unit: Option<String>,

    /// Composite descriptor
    pub composite: Option<CompositeRef>,

    /// Display alias
    pub alias: Option<String>,

    /// Preparation note
    pub preparation: Option<String>,

    /// Named modifiers
    pub modifiers: Vec<Modifier>,

    /// Mass in grams, when normalization succeeded
    #[serde(flatten)]
    pub mass: Option<MassEstimate>,

    /// Scaling flag (`true` for fixed ingredients, `false` for scalable cookware)
    pub fixed: Option<bool>,

    /// Part of a dependency cycle
    #[serde(rename = "isCircular", skip_serializing_if = "std::ops::Not::not")]
    pub is_circular: bool,

    /// Target identities of a relative quantity
    pub dependencies: Vec<String>,

    /// Relative quantity descriptor
    pub formula: Option<Formula>,
}

impl ItemUsage {
    /// Empty usage for an identity
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            qty: None,
            unit: None,
            composite: None,
            alias: None,
            preparation: None,
            modifiers: Vec::new(),
            mass: None,
            fixed: None,
            is_circular: false,
            dependencies: Vec::new(),
            formula: None,
        }
    }

    /// Whether the formula of this usage could not be resolved
    pub fn is_ghost(&self) -> bool {
        self.formula.as_ref().is_some_and(|f| f.is_ghost)
    }

    /// Mass that counts toward totals; ghosts never count
    pub fn known_mass(&self) -> Option<&MassEstimate> {
        if self.is_ghost() {
            return None;
        }
        self.mass.as_ref()
    }

    /// Whether the usage carries a modifier
    pub fn has_modifier(&self, modifier: &Modifier) -> bool {
        self.modifiers.contains(modifier)
    }
}

/// Reference usage (`&name`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceUsage {
    /// Referenced identity
    pub id: String,
    /// Referenced display name
    pub name: String,
    /// Explicit quantity
    pub qty: Option<Amount>,
    /// Explicit unit
    pub unit: Option<String>,
    /// Mass from the explicit quantity or the referenced preparation
    #[serde(flatten)]
    pub mass: Option<MassEstimate>,
}

/// Group of mutually exclusive options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeUsage {
    /// Always `"alternative"`
    pub id: String,
    /// Resolved options in document order
    pub options: Vec<Usage>,
}

impl AlternativeUsage {
    /// Group over resolved options
    pub fn new(options: Vec<Usage>) -> Self {
        Self {
            id: "alternative".to_string(),
            options,
        }
    }
}

/// Timer usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerUsage {
    /// Label
    pub name: Option<String>,
    /// Duration as written
    pub quantity: Option<QuantityValue>,
    /// Display unit
    pub unit: Option<String>,
    /// Runs in the background
    #[serde(rename = "isAsync", skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
}

/// Temperature usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureUsage {
    /// Label
    pub name: Option<String>,
    /// Value as written
    pub quantity: Option<QuantityValue>,
    /// Unit
    pub unit: Option<String>,
}

/// Quantity attached to a usage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Amount {
    /// Plain number
    Number(f64),
    /// Free text (`a pinch`)
    Text(String),
    /// Fraction or range, kept structured
    Structured(QuantityValue),
}

impl Amount {
    /// Numeric value for computation (ranges use their mean)
    pub fn number(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(_) => None,
            Amount::Structured(value) => value.number(),
        }
    }

    /// Display form of the amount
    pub fn display(&self) -> String {
        match self {
            Amount::Number(n) => format_number(*n),
            Amount::Text(text) => text.clone(),
            Amount::Structured(value) => display_value(value),
        }
    }
}

impl From<&QuantityValue> for Amount {
    fn from(value: &QuantityValue) -> Self {
        match value {
            QuantityValue::Single { value, .. } => Amount::Number(*value),
            QuantityValue::Text { value } => Amount::Text(value.clone()),
            other => Amount::Structured(other.clone()),
        }
    }
}

/// Display form of a quantity value as written
pub fn display_value(value: &QuantityValue) -> String {
    match value {
        QuantityValue::Single { value, .. } => format_number(*value),
        QuantityValue::Fraction { value, text, .. } | QuantityValue::Range { value, text, .. } => {
            text.clone().unwrap_or_else(|| format_number(*value))
        }
        QuantityValue::Text { value } => value.clone(),
    }
}

/// Shortest decimal form (`3`, `0.5`)
pub fn format_number(n: f64) -> String {
    format!("{}", n)
}

/// Round to two decimals
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Named modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// `?`
    Optional,
    /// `-`
    Hidden,
    /// `&`
    Reference,
    /// `*`
    BakersPercentage,
    /// Unrecognized symbol, kept as written
    Other(String),
}

impl Modifier {
    /// Map a modifier symbol to its name
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "?" => Modifier::Optional,
            "-" => Modifier::Hidden,
            "&" => Modifier::Reference,
            "*" => Modifier::BakersPercentage,
            other => Modifier::Other(other.to_string()),
        }
    }

    /// Output name
    pub fn as_str(&self) -> &str {
        match self {
            Modifier::Optional => "optional",
            Modifier::Hidden => "hidden",
            Modifier::Reference => "reference",
            Modifier::BakersPercentage => "bakers_percentage",
            Modifier::Other(symbol) => symbol,
        }
    }
}

impl Serialize for Modifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Relative quantity descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formula {
    /// Display string (`50% of @flour`)
    pub raw: String,
    /// Target display name
    pub target: String,
    /// Percentage
    pub percent: f64,
    /// Target could not be resolved to a mass
    #[serde(rename = "isGhost")]
    pub is_ghost: bool,
}

/// Composite descriptor on a usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeRef {
    /// Parent display name
    pub parent: String,
    /// Parent quantity
    pub quantity: Option<Amount>,
    /// Parent unit
    pub unit: Option<String>,
}

/// Result of mass normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassEstimate {
    /// Grams
    #[serde(rename = "normalizedMass")]
    pub mass: f64,

    /// Which branch of the cascade produced the figure
    #[serde(rename = "conversionMethod")]
    pub method: ConversionMethod,

    /// Approximation rather than an exact conversion
    #[serde(rename = "isEstimate")]
    pub is_estimate: bool,
}

/// How a mass was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMethod {
    /// Mass unit
    Physical,
    /// Volume × database density
    Density,
    /// Count × database unit weight
    UnitWeight,
    /// Volume × water density
    Default,
    /// Recipe or project override
    Explicit,
    /// Inherited from an intermediate preparation
    Variable,
}

// =============================================================================
// Sections and steps
// =============================================================================

/// Compiled section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Title
    pub title: Option<String>,
    /// Ingredient usages (and ingredient alternatives)
    pub ingredients: Vec<Usage>,
    /// Cookware usages (and cookware alternatives)
    pub cookware: Vec<Usage>,
    /// Steps and comments in order
    pub steps: Vec<StepBlock>,
    /// Preparation produced by the section
    pub intermediate_preparation: Option<String>,
    /// Retro-planning label
    pub retro_planning: Option<String>,
    /// Mass metrics over the section's ingredients
    pub metrics: Option<MassMetrics>,
}

/// Step or comment inside a section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepBlock {
    /// A compiled step
    Step(Step),
    /// A comment between steps
    Comment(CommentNode),
}

/// Compiled step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Reconstructed display text
    pub value: String,
    /// Action verb
    pub action: Option<String>,
    /// Ordered content
    pub content: Vec<StepContent>,
    /// Position on the cook timeline
    pub timings: Timings,
    /// Asynchronous timers started by this step
    #[serde(rename = "backgroundTasks")]
    pub background_tasks: Vec<BackgroundTask>,
    /// Identity of the preparation this step produces
    pub intermediate_preparation: Option<String>,
}

/// Step content item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepContent {
    /// Literal text
    Text(String),
    /// Resolved usage
    Usage(Usage),
}

/// Step timing in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timings {
    /// Cursor when the step starts
    pub start: f64,
    /// Cursor when the step ends
    pub end: f64,
    /// Time the cook is busy
    #[serde(rename = "activeDuration")]
    pub active_duration: f64,
}

/// Timer running in the background
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundTask {
    /// Timer label (`Timer` when unnamed)
    pub name: String,
    /// Duration in minutes
    pub duration: f64,
    /// Offset from the step start
    #[serde(rename = "startOffset")]
    pub start_offset: f64,
}

/// Aggregated mass of an intermediate preparation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableWeight {
    /// Grams
    pub mass: f64,
    /// Some contributing item had no mass
    pub is_partial: bool,
}

/// Mass totals over a set of usages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MassMetrics {
    /// Grams, rounded to two decimals
    #[serde(rename = "totalMass")]
    pub total_mass: f64,
    /// Reliability of the total
    #[serde(rename = "massStatus")]
    pub mass_status: MassStatus,
    /// Display names of usages without a mass
    #[serde(rename = "missingMassIngredients")]
    pub missing_mass_ingredients: Vec<String>,
}

/// Reliability of a mass total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MassStatus {
    /// Every figure exact
    Precise,
    /// Every usage has a mass, some estimated
    Estimated,
    /// Some usage has no mass
    Incomplete,
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Non-fatal diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Category
    pub code: WarningCode,
    /// Human-readable message
    pub message: String,
    /// Offending item
    pub item: Option<String>,
    /// Offending section
    pub section: Option<String>,
}

impl Warning {
    /// Warning about an item
    pub fn item(code: WarningCode, message: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item: Some(item.into()),
            section: None,
        }
    }

    /// Warning about a section
    pub fn section(code: WarningCode, message: impl Into<String>, section: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item: None,
            section,
        }
    }
}

/// Diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// `&variable` used before any declaration
    VariableNotFound,
    /// `@target` of a relative quantity not earlier in the section
    RelativeQuantityUnresolved,
    /// `@target` found but without a mass
    RelativeNoMass,
    /// Relative quantity targets itself
    CircularReference,
    /// Reference to something never declared
    UndefinedReference,
    /// Intermediate declared by two sections
    ScopeConflict,
    /// Free-text timer or temperature
    InvalidUnit,
    /// Timer or temperature without a unit
    MissingUnit,
}

impl WarningCode {
    /// Name as it appears in compiled output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VariableNotFound => "VARIABLE_NOT_FOUND",
            Self::RelativeQuantityUnresolved => "RELATIVE_QUANTITY_UNRESOLVED",
            Self::RelativeNoMass => "RELATIVE_NO_MASS",
            Self::CircularReference => "CIRCULAR_REFERENCE",
            Self::UndefinedReference => "UNDEFINED_REFERENCE",
            Self::ScopeConflict => "SCOPE_CONFLICT",
            Self::InvalidUnit => "INVALID_UNIT",
            Self::MissingUnit => "MISSING_UNIT",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Compilation result
// =============================================================================

/// Fully resolved recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    /// Recipe title
    pub title: Option<String>,
    /// Slug of the title
    pub slug: Option<String>,
    /// Metadata as given
    pub meta: Meta,
    /// Canonical entries
    pub registry: Registry,
    /// Consolidated shopping list
    pub shopping_list: Vec<ShoppingItem>,
    /// Non-reference cookware usages across sections
    pub cookware: Vec<Usage>,
    /// Compiled sections
    pub sections: Vec<Section>,
    /// Diagnostics in the order they were raised
    pub warnings: Vec<Warning>,
    /// Document metrics
    pub metrics: Metrics,
}

/// Document-level metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Critical-path length in minutes
    #[serde(rename = "totalTime")]
    pub total_time: f64,
    /// Sum of active step time in minutes
    #[serde(rename = "activeTime")]
    pub active_time: f64,
    /// Estimated mise-en-place minutes
    #[serde(rename = "preparationTime")]
    pub preparation_time: u32,
    /// Mass over all non-reference ingredient usages
    #[serde(flatten)]
    pub mass: MassMetrics,
    /// Nutrition estimate
    pub nutrition: Option<Nutrition>,
}

/// Best-effort nutrition estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nutrition {
    /// Whole recipe
    pub total: Macros,
    /// Per portion when the recipe serves more than one
    #[serde(rename = "perPortion")]
    pub per_portion: Option<Macros>,
    /// Always true
    #[serde(rename = "isEstimate")]
    pub is_estimate: bool,
    /// Share of counted usages with known macros
    pub coverage: f64,
}
