//! Alternative groups (`@butter|oil`)

use gram_core::document::{AlternativeNode, Item};

use super::{Resolved, SectionLists};
use crate::model::{AlternativeUsage, Usage};
use crate::sections::SectionCompiler;

impl SectionCompiler<'_> {
    /// Resolve options in order against a scratch copy of the section lists.
    ///
    /// Later options see earlier ones (`@a{100g}|b{50% of @a}`), but only the
    /// finished group lands in the real lists.
    pub(crate) fn resolve_alternative(&mut self, node: &AlternativeNode, lists: &mut SectionLists) -> Usage {
        let mut scratch = lists.clone();
        let mut options = Vec::with_capacity(node.options.len());

        for option in &node.options {
            match self.resolve_item(option, &mut scratch) {
                Resolved::Usage(usage) => options.push(usage),
                Resolved::Text(_) | Resolved::Nothing => {}
            }
        }

        let usage = Usage::Alternative(AlternativeUsage::new(options));
        match node.options.first() {
            Some(Item::Ingredient(_)) => lists.ingredients.push(usage.clone()),
            Some(Item::Cookware(_)) => lists.cookware.push(usage.clone()),
            _ => tracing::debug!("Alternative group without ingredient or cookware options"),
        }
        usage
    }
}

#[cfg(test)]
mod tests {
    use crate::ingredients::BuiltinIngredients;
    use crate::mass::Normalizer;
    use crate::model::Usage;
    use crate::sections::compile_sections;
    use gram_core::Overrides;
    use gram_core::document::Recipe;
    use serde_json::json;

    #[test]
    fn test_later_option_sees_earlier_option() {
        let recipe = Recipe::from_value(json!({
            "type": "Recipe",
            "children": [{"type": "Step", "children": [{
                "type": "Alternative",
                "options": [
                    {"type": "Ingredient", "name": "butter", "modifiers": [],
                     "quantity": {"type": "Quantity", "value": {"type": "single", "value": 100}, "unit": "g"}},
                    {"type": "Ingredient", "name": "oil", "modifiers": [],
                     "quantity": {"type": "RelativeQuantity", "percent": 80, "target": "butter", "referenceType": "ingredient"}}
                ]
            }]}]
        }))
        .unwrap();
        let overrides = Overrides::new();
        let compiled =
            compile_sections(&recipe.children, Normalizer::new(&overrides, &BuiltinIngredients));

        let section = &compiled.sections[0];
        assert_eq!(section.ingredients.len(), 1);
        let Usage::Alternative(group) = &section.ingredients[0] else {
            panic!("Expected alternative");
        };
        assert_eq!(group.id, "alternative");
        let oil = group.options[1].as_ingredient().unwrap();
        assert_eq!(oil.qty.as_ref().and_then(|q| q.number()), Some(80.0));
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_cookware_alternative_goes_to_cookware() {
        let recipe = Recipe::from_value(json!({
            "type": "Recipe",
            "children": [{"type": "Step", "children": [{
                "type": "Alternative",
                "options": [
                    {"type": "Cookware", "name": "wok", "modifiers": []},
                    {"type": "Cookware", "name": "skillet", "modifiers": []}
                ]
            }]}]
        }))
        .unwrap();
        let overrides = Overrides::new();
        let compiled =
            compile_sections(&recipe.children, Normalizer::new(&overrides, &BuiltinIngredients));

        let section = &compiled.sections[0];
        assert!(section.ingredients.is_empty());
        assert_eq!(section.cookware.len(), 1);
        assert_eq!(compiled.registry.cookware.len(), 2);
    }
}
