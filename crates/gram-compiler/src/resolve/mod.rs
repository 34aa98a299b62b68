//! Step item resolution
//!
//! Each document item kind resolves into a [`Usage`] (or literal text) here,
//! registering identities and pushing onto the section lists as it goes.

mod alternative;
mod ingredient;
mod reference;
mod timer;

use gram_core::document::{Item, QuantitySpec};

use crate::model::{Amount, ItemUsage, Modifier, Usage};
use crate::sections::SectionCompiler;

/// What one item resolved to
#[derive(Debug)]
pub(crate) enum Resolved {
    /// A usage to place in step content
    Usage(Usage),
    /// Literal text
    Text(String),
    /// No step content (declarations)
    Nothing,
}

/// Ingredient and cookware usages collected by a section so far
#[derive(Debug, Clone, Default)]
pub(crate) struct SectionLists {
    pub(crate) ingredients: Vec<Usage>,
    pub(crate) cookware: Vec<Usage>,
}

impl SectionCompiler<'_> {
    /// Resolve one item in document order
    pub(crate) fn resolve_item(&mut self, item: &Item, lists: &mut SectionLists) -> Resolved {
        match item {
            Item::Ingredient(node) => Resolved::Usage(self.resolve_ingredient(node, lists)),
            Item::Cookware(node) => Resolved::Usage(self.resolve_cookware(node, lists)),
            Item::Reference(node) => Resolved::Usage(self.resolve_reference(node)),
            Item::Alternative(node) => Resolved::Usage(self.resolve_alternative(node, lists)),
            Item::Timer(node) => Resolved::Usage(self.resolve_timer(node)),
            Item::Temperature(node) => Resolved::Usage(self.resolve_temperature(node)),
            Item::Text(node) => Resolved::Text(node.value.clone()),
            Item::Comment(node) => Resolved::Usage(Usage::Comment(node.clone())),
            Item::IntermediateDecl(decl) => {
                self.declare_step_intermediate(&decl.name);
                Resolved::Nothing
            }
        }
    }
}

/// Amount and unit of a quantity as written; relative quantities carry neither
pub(crate) fn quantity_parts(spec: Option<&QuantitySpec>) -> (Option<Amount>, Option<String>) {
    match spec {
        Some(QuantitySpec::Quantity(quantity)) => (
            quantity.value.as_ref().map(Amount::from),
            spec.and_then(QuantitySpec::unit).map(str::to_string),
        ),
        Some(QuantitySpec::TextQuantity(text)) => (Some(Amount::Text(text.value.clone())), None),
        Some(QuantitySpec::RelativeQuantity(_)) | None => (None, None),
    }
}

/// Usage fields shared by ingredients and cookware
pub(crate) fn base_usage(
    id: &str,
    name: &str,
    quantity: Option<&QuantitySpec>,
    modifiers: &[String],
    alias: Option<&String>,
    preparation: Option<&String>,
) -> ItemUsage {
    let (qty, unit) = quantity_parts(quantity);
    let mut usage = ItemUsage::new(id, name);
    usage.qty = qty;
    usage.unit = unit;
    usage.modifiers = modifiers.iter().map(|m| Modifier::from_symbol(m)).collect();
    usage.alias = alias.cloned();
    usage.preparation = preparation.cloned();
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use gram_core::document::{AbsoluteQuantity, QuantityValue, RelativeQuantity, ReferenceKind, TextQuantity};

    #[test]
    fn test_quantity_parts() {
        let absolute = QuantitySpec::Quantity(AbsoluteQuantity {
            value: Some(QuantityValue::Single { value: 3.0, text: None }),
            unit: Some(" ".into()),
            fixed: false,
        });
        assert_eq!(quantity_parts(Some(&absolute)), (Some(Amount::Number(3.0)), None));

        let text = QuantitySpec::TextQuantity(TextQuantity { value: "a pinch".into() });
        assert_eq!(quantity_parts(Some(&text)), (Some(Amount::Text("a pinch".into())), None));

        let relative = QuantitySpec::RelativeQuantity(RelativeQuantity {
            percent: 10.0,
            target: "flour".into(),
            reference_type: ReferenceKind::Ingredient,
        });
        assert_eq!(quantity_parts(Some(&relative)), (None, None));
        assert_eq!(quantity_parts(None), (None, None));
    }

    #[test]
    fn test_base_usage_maps_modifiers() {
        let usage = base_usage("salt", "salt", None, &["?".into(), "-".into(), "!".into()], None, None);
        assert_eq!(
            usage.modifiers,
            vec![Modifier::Optional, Modifier::Hidden, Modifier::Other("!".into())]
        );
    }
}
