//! Recipe document tree
//!
//! The parser turns recipe source text into this tree; the compiler consumes
//! it. Only the shape matters here: every node is tagged by a `type` field and
//! unknown fields (source locations, parser hints) are ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "type": "Recipe",
//!   "meta": { "title": "Crêpes", "densities": ["flour: 0.55"] },
//!   "children": [
//!     { "type": "Section", "title": null, "children": [
//!       { "type": "Step", "children": [
//!         { "type": "Text", "value": "Whisk " },
//!         { "type": "Ingredient", "name": "flour", "modifiers": [],
//!           "quantity": { "type": "Quantity", "value": { "type": "single", "value": 250 }, "unit": "g" } }
//!       ]}
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Root node type the compiler accepts.
pub const RECIPE_NODE: &str = "Recipe";

/// Front-matter metadata, ordered by key
pub type Meta = BTreeMap<String, MetaValue>;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Plain string value
    Text(String),
    /// List value (`[a, b]` in front matter)
    List(Vec<String>),
    /// Numeric value (YAML documents may carry bare numbers)
    Number(f64),
}

impl MetaValue {
    /// The value as a single string, if it is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Every string carried by this value (a scalar counts as a list of one)
    pub fn entries(&self) -> Vec<String> {
        match self {
            MetaValue::Text(s) => vec![s.clone()],
            MetaValue::List(items) => items.clone(),
            MetaValue::Number(n) => vec![n.to_string()],
        }
    }
}

/// Root of a parsed recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Node type; anything other than `"Recipe"` is rejected by the compiler
    #[serde(rename = "type")]
    pub node_type: String,

    /// Front-matter metadata
    #[serde(default)]
    pub meta: Meta,

    /// Sections, or bare steps/comments when the recipe has no headers
    #[serde(default)]
    pub children: Vec<Block>,
}

/// A top-level or section-level block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    /// A titled (or untitled) group of steps
    Section(SectionNode),
    /// A recipe step
    Step(StepNode),
    /// A comment between steps
    Comment(CommentNode),
}

/// Section header plus its blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionNode {
    /// Section title
    #[serde(default)]
    pub title: Option<String>,

    /// Retro-planning label (e.g. "D-1")
    #[serde(default, rename = "retroPlanning")]
    pub retro_planning: Option<String>,

    /// Intermediate preparation produced by the whole section
    #[serde(default, rename = "intermediateDecl")]
    pub intermediate_decl: Option<IntermediateDecl>,

    /// Steps and comments
    #[serde(default)]
    pub children: Vec<Block>,
}

/// A step: an optional action verb plus ordered content items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepNode {
    /// Explicit action verb (`[Mix]`)
    #[serde(default)]
    pub action: Option<String>,

    /// Ordered content items
    #[serde(default)]
    pub children: Vec<Item>,
}

/// Comment flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    /// `-- comment`
    #[default]
    Line,
    /// `[- comment -]`
    Block,
}

/// A comment node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    /// Comment text
    pub value: String,
    /// Line or block comment
    #[serde(default)]
    pub kind: CommentKind,
}

/// Content item inside a step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    /// `@name{qty unit}`
    Ingredient(IngredientNode),
    /// `#name{qty}`
    Cookware(CookwareNode),
    /// `&name` mention of a previous ingredient or preparation
    Reference(ReferenceNode),
    /// `@a|b` mutually exclusive options
    Alternative(AlternativeNode),
    /// `~name{qty unit}`
    Timer(TimerNode),
    /// `!name{qty unit}`
    Temperature(TemperatureNode),
    /// Literal text
    Text(TextNode),
    /// Inline comment
    Comment(CommentNode),
    /// `=> name` declaration that the step produces a preparation
    IntermediateDecl(IntermediateDecl),
}

/// Declaration of a named intermediate preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateDecl {
    /// Preparation name
    pub name: String,
}

/// An ingredient occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientNode {
    /// Display name
    pub name: String,

    /// Modifier symbols (`?`, `-`, `&`, `*`)
    #[serde(default)]
    pub modifiers: Vec<String>,

    /// Quantity, if any
    #[serde(default)]
    pub quantity: Option<QuantitySpec>,

    /// Display alias
    #[serde(default)]
    pub alias: Option<String>,

    /// Preparation note ("finely chopped")
    #[serde(default)]
    pub preparation: Option<String>,

    /// Share of a larger parent item (egg white of an egg)
    #[serde(default)]
    pub composite: Option<CompositeNode>,
}

/// Composite descriptor: `< @egg{6}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeNode {
    /// Parent display name
    pub parent: String,
    /// Parent quantity this share is taken from
    #[serde(default)]
    pub quantity: Option<AbsoluteQuantity>,
}

/// A cookware occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookwareNode {
    /// Display name
    pub name: String,

    /// Modifier symbols
    #[serde(default)]
    pub modifiers: Vec<String>,

    /// Display alias
    #[serde(default)]
    pub alias: Option<String>,

    /// Count, if any
    #[serde(default)]
    pub quantity: Option<QuantitySpec>,

    /// Preparation note
    #[serde(default)]
    pub preparation: Option<String>,
}

/// Bare mention of a previously declared ingredient or preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceNode {
    /// Referenced display name
    pub name: String,
    /// Explicit quantity, if any
    #[serde(default)]
    pub quantity: Option<QuantitySpec>,
}

/// Group of mutually exclusive options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeNode {
    /// Options in document order (ingredients or cookware)
    #[serde(default)]
    pub options: Vec<Item>,
}

/// A timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerNode {
    /// Timer label
    #[serde(default)]
    pub name: Option<String>,
    /// Duration
    #[serde(default)]
    pub quantity: Option<QuantitySpec>,
    /// Runs in the background without blocking the cook
    #[serde(default, rename = "isAsync")]
    pub is_async: bool,
}

/// A temperature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureNode {
    /// Label
    #[serde(default)]
    pub name: Option<String>,
    /// Temperature value
    #[serde(default)]
    pub quantity: Option<QuantitySpec>,
}

/// Literal step text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    /// The text, whitespace included
    pub value: String,
}

/// Any quantity attached to an item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuantitySpec {
    /// Number (or range/fraction) with optional unit
    Quantity(AbsoluteQuantity),
    /// `N% of @target` or `N% of &variable`
    RelativeQuantity(RelativeQuantity),
    /// Free text (`{a pinch}`)
    TextQuantity(TextQuantity),
}

impl QuantitySpec {
    /// Whether a quantity is actually given
    pub fn is_present(&self) -> bool {
        match self {
            QuantitySpec::Quantity(q) => q.value.is_some(),
            QuantitySpec::RelativeQuantity(_) | QuantitySpec::TextQuantity(_) => true,
        }
    }

    /// Unit, when this is an absolute quantity that has one
    pub fn unit(&self) -> Option<&str> {
        match self {
            QuantitySpec::Quantity(q) => q.unit.as_deref().filter(|u| !u.trim().is_empty()),
            _ => None,
        }
    }
}

/// Absolute quantity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbsoluteQuantity {
    /// Amount
    #[serde(default)]
    pub value: Option<QuantityValue>,
    /// Unit as written
    #[serde(default)]
    pub unit: Option<String>,
    /// Does not scale with servings (`{=2 g}`)
    #[serde(default)]
    pub fixed: bool,
}

/// What a relative quantity points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// `&name`: an intermediate preparation
    Variable,
    /// `@name`: an earlier ingredient in the same section
    Ingredient,
}

impl ReferenceKind {
    /// Marker character used in display formulas
    pub fn marker(self) -> char {
        match self {
            ReferenceKind::Variable => '&',
            ReferenceKind::Ingredient => '@',
        }
    }
}

/// Percentage of another ingredient or preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeQuantity {
    /// Percentage (50 means half)
    pub percent: f64,
    /// Target display name
    pub target: String,
    /// Variable or ingredient target
    #[serde(rename = "referenceType")]
    pub reference_type: ReferenceKind,
}

/// Free-text quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextQuantity {
    /// The text
    pub value: String,
}

/// Range bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

/// Numeric payload of an absolute quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuantityValue {
    /// `250`
    Single {
        /// Value
        value: f64,
        /// Source text
        #[serde(default)]
        text: Option<String>,
    },
    /// `1/2`
    Fraction {
        /// Decimal value
        value: f64,
        /// Numerator
        #[serde(default)]
        numerator: Option<f64>,
        /// Denominator
        #[serde(default)]
        denominator: Option<f64>,
        /// Source text
        #[serde(default)]
        text: Option<String>,
    },
    /// `2-3`; `value` is the mean
    Range {
        /// Mean of the bounds
        value: f64,
        /// Bounds
        #[serde(default)]
        range: Option<Bounds>,
        /// Source text
        #[serde(default)]
        text: Option<String>,
    },
    /// Non-numeric value
    Text {
        /// The text
        value: String,
    },
}

impl QuantityValue {
    /// Numeric value used for computation (ranges use their mean)
    pub fn number(&self) -> Option<f64> {
        match self {
            QuantityValue::Single { value, .. } | QuantityValue::Fraction { value, .. } => {
                Some(*value)
            }
            QuantityValue::Range { value, range, .. } => match range {
                Some(b) => Some((b.min + b.max) / 2.0),
                None => Some(*value),
            },
            QuantityValue::Text { .. } => None,
        }
    }
}

impl Recipe {
    /// Whether the root node is a recipe
    pub fn is_recipe(&self) -> bool {
        self.node_type == RECIPE_NODE
    }

    /// Parse a JSON document tree
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a YAML document tree
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Build from an in-memory JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Load a document tree from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let contents = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded document {} ({} bytes)", path.display(), contents.len());

        match extension.as_str() {
            "json" => Self::from_json_str(&contents),
            "yaml" | "yml" => Self::from_yaml_str(&contents),
            _ => Err(Error::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            }),
        }
    }

    /// Recipe title from metadata
    pub fn title(&self) -> Option<&str> {
        self.meta.get("title").and_then(MetaValue::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_recipe() {
        let recipe = Recipe::from_json_str(r#"{"type": "Recipe", "meta": {}, "children": []}"#)
            .unwrap();
        assert!(recipe.is_recipe());
        assert!(recipe.children.is_empty());
        assert!(recipe.title().is_none());
    }

    #[test]
    fn test_non_recipe_root_still_parses() {
        let recipe = Recipe::from_json_str(r#"{"type": "Section", "children": []}"#).unwrap();
        assert!(!recipe.is_recipe());
    }

    #[test]
    fn test_parse_ingredient_with_quantity() {
        let recipe = Recipe::from_value(json!({
            "type": "Recipe",
            "meta": {"title": "Bread"},
            "children": [{
                "type": "Section",
                "title": null,
                "children": [{
                    "type": "Step",
                    "children": [
                        {"type": "Text", "value": "Add "},
                        {
                            "type": "Ingredient",
                            "name": "flour",
                            "modifiers": [],
                            "quantity": {
                                "type": "Quantity",
                                "value": {"type": "single", "value": 500, "text": "500"},
                                "unit": "g",
                                "fixed": false
                            },
                            "loc": {"start": 4, "end": 16}
                        }
                    ]
                }]
            }]
        }))
        .unwrap();

        assert_eq!(recipe.title(), Some("Bread"));
        let Block::Section(section) = &recipe.children[0] else {
            panic!("Expected section");
        };
        let Block::Step(step) = &section.children[0] else {
            panic!("Expected step");
        };
        match &step.children[1] {
            Item::Ingredient(ing) => {
                assert_eq!(ing.name, "flour");
                let quantity = ing.quantity.as_ref().unwrap();
                assert_eq!(quantity.unit(), Some("g"));
                match quantity {
                    QuantitySpec::Quantity(q) => {
                        assert_eq!(q.value.as_ref().unwrap().number(), Some(500.0))
                    }
                    _ => panic!("Expected absolute quantity"),
                }
            }
            _ => panic!("Expected ingredient"),
        }
    }

    #[test]
    fn test_parse_relative_quantity() {
        let spec: QuantitySpec = serde_json::from_value(json!({
            "type": "RelativeQuantity",
            "percent": 50,
            "target": "flour",
            "referenceType": "ingredient"
        }))
        .unwrap();

        match spec {
            QuantitySpec::RelativeQuantity(rel) => {
                assert_eq!(rel.percent, 50.0);
                assert_eq!(rel.reference_type, ReferenceKind::Ingredient);
                assert_eq!(rel.reference_type.marker(), '@');
            }
            _ => panic!("Expected relative quantity"),
        }
    }

    #[test]
    fn test_range_number_uses_mean() {
        let value: QuantityValue = serde_json::from_value(json!({
            "type": "range", "value": 2.5, "range": {"min": 2, "max": 4}, "text": "2-4"
        }))
        .unwrap();
        assert_eq!(value.number(), Some(3.0));

        let text = QuantityValue::Text {
            value: "some".to_string(),
        };
        assert_eq!(text.number(), None);
    }

    #[test]
    fn test_meta_value_entries() {
        let meta: Meta = serde_json::from_value(json!({
            "title": "Cake",
            "densities": ["flour: 0.55", "sugar: 0.85"],
            "servings": 4
        }))
        .unwrap();

        assert_eq!(meta["title"].as_text(), Some("Cake"));
        assert_eq!(meta["densities"].entries().len(), 2);
        assert_eq!(meta["servings"].entries(), vec!["4".to_string()]);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
type: Recipe
meta:
  title: Tea
children:
  - type: Step
    children:
      - type: Timer
        name: steep
        isAsync: true
        quantity:
          type: Quantity
          value: { type: single, value: 4 }
          unit: min
"#;
        let recipe = Recipe::from_yaml_str(yaml).unwrap();
        let Block::Step(step) = &recipe.children[0] else {
            panic!("Expected step");
        };
        match &step.children[0] {
            Item::Timer(timer) => {
                assert!(timer.is_async);
                assert_eq!(timer.name.as_deref(), Some("steep"));
            }
            _ => panic!("Expected timer"),
        }
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.txt");
        std::fs::write(&path, "{}").unwrap();

        let err = Recipe::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
