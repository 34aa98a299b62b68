//! Ingredients, relative quantities and cookware

use gram_core::document::{CookwareNode, IngredientNode, QuantitySpec, ReferenceKind, RelativeQuantity};
use gram_core::slugify;

use super::{SectionLists, base_usage};
use crate::model::{
    Amount, CompositeRef, Formula, ItemUsage, Modifier, Usage, Warning, WarningCode,
    format_number, round2,
};
use crate::sections::SectionCompiler;

/// Unit given to resolved relative quantities
const RELATIVE_UNIT: &str = "g";

impl SectionCompiler<'_> {
    pub(crate) fn resolve_ingredient(&mut self, node: &IngredientNode, lists: &mut SectionLists) -> Usage {
        let id = slugify(&node.name);
        let unit = node.quantity.as_ref().and_then(QuantitySpec::unit);
        self.registry.intern_ingredient(&id, &node.name, unit);

        if let Some(composite) = &node.composite {
            let parent_id = slugify(&composite.parent);
            let entry = self.registry.intern_ingredient(&id, &node.name, None);
            entry.is_composite = true;
            entry.parent = Some(parent_id.clone());
            self.registry
                .intern_ingredient(&parent_id, &composite.parent, None)
                .is_composite = true;
        }

        if let Some(QuantitySpec::RelativeQuantity(relative)) = &node.quantity {
            let usage = Usage::Ingredient(self.resolve_relative(node, &id, relative, lists));
            lists.ingredients.push(usage.clone());
            return usage;
        }

        let mut usage = self.ingredient_usage(node, &id);
        if let Some(amount) = usage.qty.as_ref().and_then(Amount::number) {
            let unit = usage.unit.as_deref().unwrap_or_default();
            usage.mass = self.normalizer.normalize(amount, unit, &node.name);
        }

        let is_reference = usage.has_modifier(&Modifier::Reference);
        if is_reference {
            if !self.scope.seen_names.contains(&node.name) {
                self.warn(Warning::item(
                    WarningCode::UndefinedReference,
                    format!("Reference to undefined ingredient '@&{}'", node.name),
                    &node.name,
                ));
            }
            self.scope.note_use(&node.name);
        } else {
            self.scope.seen_names.insert(node.name.clone());
        }

        let usage = Usage::Ingredient(usage);
        // A bare reference adds no shopping entry of its own
        let has_quantity = node.quantity.as_ref().is_some_and(QuantitySpec::is_present);
        if !is_reference || has_quantity {
            lists.ingredients.push(usage.clone());
        }
        usage
    }

    fn ingredient_usage(&self, node: &IngredientNode, id: &str) -> ItemUsage {
        let mut usage = base_usage(
            id,
            &node.name,
            node.quantity.as_ref(),
            &node.modifiers,
            node.alias.as_ref(),
            node.preparation.as_ref(),
        );

        usage.fixed = match &node.quantity {
            Some(QuantitySpec::Quantity(quantity)) if quantity.fixed => Some(true),
            Some(QuantitySpec::TextQuantity(_)) => Some(true),
            _ => None,
        };

        usage.composite = node.composite.as_ref().map(|composite| CompositeRef {
            parent: composite.parent.clone(),
            quantity: composite
                .quantity
                .as_ref()
                .and_then(|q| q.value.as_ref())
                .map(Amount::from),
            unit: composite
                .quantity
                .as_ref()
                .and_then(|q| q.unit.clone())
                .filter(|u| !u.trim().is_empty()),
        });
        usage
    }

    /// `N% of @ingredient` or `N% of &preparation`
    fn resolve_relative(
        &mut self,
        node: &IngredientNode,
        id: &str,
        relative: &RelativeQuantity,
        lists: &SectionLists,
    ) -> ItemUsage {
        let target_id = slugify(&relative.target);
        let marker = relative.reference_type.marker();
        let mut total = 0.0;
        let mut is_ghost = false;

        match relative.reference_type {
            ReferenceKind::Variable => {
                match self.scope.variable_weights.get(&target_id).copied() {
                    Some(weight) => total = weight.mass,
                    None => {
                        is_ghost = true;
                        self.warn(Warning::item(
                            WarningCode::VariableNotFound,
                            format!("Variable '&{}' is not declared before this point", relative.target),
                            &node.name,
                        ));
                    }
                }
            }
            ReferenceKind::Ingredient => {
                // Linear scan of earlier usages in this section only
                let matches: Vec<&ItemUsage> = lists
                    .ingredients
                    .iter()
                    .filter_map(Usage::as_ingredient)
                    .filter(|usage| usage.id == target_id)
                    .collect();
                let masses: Vec<f64> = matches
                    .iter()
                    .filter_map(|usage| usage.known_mass())
                    .map(|mass| mass.mass)
                    .collect();

                if matches.is_empty() {
                    is_ghost = true;
                    self.warn(Warning::item(
                        WarningCode::RelativeQuantityUnresolved,
                        format!(
                            "Could not resolve relative quantity for '@{}': no earlier occurrence in this section",
                            relative.target
                        ),
                        &node.name,
                    ));
                } else if masses.is_empty() {
                    is_ghost = true;
                    self.warn(Warning::item(
                        WarningCode::RelativeNoMass,
                        format!(
                            "Source '@{}' has no mass (unitless or unconvertible)",
                            relative.target
                        ),
                        &node.name,
                    ));
                } else {
                    total = masses.iter().sum();
                }
            }
        }

        let qty = round2(total * relative.percent / 100.0);
        let mut usage = self.ingredient_usage(node, id);
        usage.qty = Some(Amount::Number(qty));
        usage.unit = Some(RELATIVE_UNIT.to_string());
        usage.mass = self.normalizer.normalize(qty, RELATIVE_UNIT, &node.name);

        if target_id == id {
            usage.is_circular = true;
            self.warn(Warning::item(
                WarningCode::CircularReference,
                format!("Circular reference: '{}' depends on itself", node.name),
                &node.name,
            ));
        }

        usage.formula = Some(Formula {
            raw: format!("{}% of {}{}", format_number(relative.percent), marker, relative.target),
            target: relative.target.clone(),
            percent: relative.percent,
            is_ghost,
        });
        // Relative quantities are not declarations a later `@&name` can point at
        usage.dependencies = vec![target_id];
        usage
    }

    pub(crate) fn resolve_cookware(&mut self, node: &CookwareNode, lists: &mut SectionLists) -> Usage {
        let id = slugify(&node.name);
        self.registry.intern_cookware(&id, &node.name);

        let mut usage = base_usage(
            &id,
            &node.name,
            node.quantity.as_ref(),
            &node.modifiers,
            node.alias.as_ref(),
            node.preparation.as_ref(),
        );
        usage.fixed = match &node.quantity {
            Some(QuantitySpec::Quantity(quantity)) if !quantity.fixed => Some(false),
            Some(QuantitySpec::TextQuantity(_)) => Some(true),
            _ => None,
        };

        let usage = Usage::Cookware(usage);
        lists.cookware.push(usage.clone());
        usage
    }
}

#[cfg(test)]
mod tests {
    use crate::ingredients::BuiltinIngredients;
    use crate::mass::Normalizer;
    use crate::model::{ConversionMethod, Usage, WarningCode};
    use crate::sections::{CompiledSections, compile_sections};
    use gram_core::Overrides;
    use gram_core::document::Recipe;
    use serde_json::{Value, json};

    fn compile_items(items: Value) -> CompiledSections {
        let recipe = Recipe::from_value(json!({
            "type": "Recipe",
            "children": [{"type": "Step", "children": items}]
        }))
        .unwrap();
        let overrides = Overrides::new();
        compile_sections(&recipe.children, Normalizer::new(&overrides, &BuiltinIngredients))
    }

    fn grams(name: &str, value: f64) -> Value {
        json!({"type": "Ingredient", "name": name, "modifiers": [],
               "quantity": {"type": "Quantity", "value": {"type": "single", "value": value}, "unit": "g"}})
    }

    fn relative(name: &str, percent: f64, target: &str, kind: &str) -> Value {
        json!({"type": "Ingredient", "name": name, "modifiers": [],
               "quantity": {"type": "RelativeQuantity", "percent": percent, "target": target, "referenceType": kind}})
    }

    fn ingredients(compiled: &CompiledSections) -> Vec<&crate::model::ItemUsage> {
        compiled.sections[0]
            .ingredients
            .iter()
            .filter_map(Usage::as_ingredient)
            .collect()
    }

    #[test]
    fn test_relative_to_earlier_ingredient() {
        let compiled = compile_items(json!([grams("flour", 500.0), relative("water", 50.0, "flour", "ingredient")]));
        let water = ingredients(&compiled)[1];

        assert_eq!(water.qty.as_ref().and_then(|q| q.number()), Some(250.0));
        assert_eq!(water.unit.as_deref(), Some("g"));
        assert_eq!(water.mass.map(|m| m.method), Some(ConversionMethod::Physical));
        assert_eq!(water.dependencies, vec!["flour".to_string()]);

        let formula = water.formula.as_ref().unwrap();
        assert_eq!(formula.raw, "50% of @flour");
        assert!(!formula.is_ghost);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_relative_sums_every_earlier_occurrence() {
        let compiled = compile_items(json!([
            grams("flour", 300.0),
            grams("flour", 200.0),
            relative("salt", 2.0, "flour", "ingredient")
        ]));
        assert_eq!(ingredients(&compiled)[2].qty.as_ref().and_then(|q| q.number()), Some(10.0));
    }

    #[test]
    fn test_relative_to_missing_ingredient_is_ghost() {
        let compiled = compile_items(json!([relative("water", 50.0, "flour", "ingredient")]));
        let water = ingredients(&compiled)[0];

        assert!(water.is_ghost());
        assert_eq!(water.qty.as_ref().and_then(|q| q.number()), Some(0.0));
        assert_eq!(compiled.warnings[0].code, WarningCode::RelativeQuantityUnresolved);
    }

    #[test]
    fn test_relative_to_massless_ingredient() {
        let compiled = compile_items(json!([
            {"type": "Ingredient", "name": "stone", "modifiers": [],
             "quantity": {"type": "Quantity", "value": {"type": "single", "value": 2}}},
            relative("water", 50.0, "stone", "ingredient")
        ]));
        assert!(ingredients(&compiled)[1].is_ghost());
        assert_eq!(compiled.warnings[0].code, WarningCode::RelativeNoMass);
    }

    #[test]
    fn test_undeclared_variable() {
        let compiled = compile_items(json!([relative("Y", 20.0, "unknown", "variable")]));
        let y = ingredients(&compiled)[0];

        assert!(y.is_ghost());
        assert_eq!(y.formula.as_ref().unwrap().raw, "20% of &unknown");
        assert_eq!(compiled.warnings[0].code, WarningCode::VariableNotFound);
    }

    #[test]
    fn test_direct_self_reference() {
        let compiled = compile_items(json!([relative("X", 10.0, "X", "ingredient")]));
        let x = ingredients(&compiled)[0];

        assert!(x.is_circular);
        assert_eq!(x.qty.as_ref().and_then(|q| q.number()), Some(0.0));
        let codes: Vec<_> = compiled.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&WarningCode::CircularReference));
    }

    #[test]
    fn test_undefined_reference_modifier() {
        let compiled = compile_items(json!([
            {"type": "Ingredient", "name": "butter", "modifiers": ["&"]},
            grams("sugar", 100.0),
            {"type": "Ingredient", "name": "sugar", "modifiers": ["&"]}
        ]));

        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].code, WarningCode::UndefinedReference);
        assert_eq!(compiled.warnings[0].item.as_deref(), Some("butter"));
        // Bare references add nothing to the section list
        assert_eq!(ingredients(&compiled).len(), 1);
    }

    #[test]
    fn test_reference_to_relative_quantity_is_undefined() {
        let compiled = compile_items(json!([
            grams("flour", 500.0),
            relative("water", 50.0, "flour", "ingredient"),
            {"type": "Ingredient", "name": "water", "modifiers": ["&"]}
        ]));

        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].code, WarningCode::UndefinedReference);
        assert_eq!(compiled.warnings[0].item.as_deref(), Some("water"));
    }

    #[test]
    fn test_composite_registration() {
        let compiled = compile_items(json!([
            {"type": "Ingredient", "name": "egg white", "modifiers": [],
             "quantity": {"type": "Quantity", "value": {"type": "single", "value": 6}},
             "composite": {"parent": "egg", "quantity": {"value": {"type": "single", "value": 6}}}}
        ]));

        let entry = &compiled.registry.ingredients["egg-white"];
        assert!(entry.is_composite);
        assert_eq!(entry.parent.as_deref(), Some("egg"));
        assert!(compiled.registry.ingredients["egg"].is_composite);

        let usage = ingredients(&compiled)[0];
        let composite = usage.composite.as_ref().unwrap();
        assert_eq!(composite.parent, "egg");
        assert_eq!(composite.quantity.as_ref().and_then(|q| q.number()), Some(6.0));
        assert_eq!(usage.mass.map(|m| m.mass), Some(198.0));
    }

    #[test]
    fn test_cookware_has_no_mass() {
        let compiled = compile_items(json!([
            {"type": "Cookware", "name": "Pan", "modifiers": [],
             "quantity": {"type": "Quantity", "value": {"type": "single", "value": 2}, "fixed": false}}
        ]));

        assert!(compiled.registry.cookware.contains_key("pan"));
        match &compiled.sections[0].cookware[0] {
            Usage::Cookware(pan) => {
                assert!(pan.mass.is_none());
                assert_eq!(pan.fixed, Some(false));
            }
            _ => panic!("Expected cookware"),
        }
    }
}
