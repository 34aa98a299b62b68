//! References (`&name`) and step-level intermediate declarations

use gram_core::document::ReferenceNode;
use gram_core::slugify;

use super::quantity_parts;
use crate::model::{
    Amount, ConversionMethod, MassEstimate, ReferenceUsage, Usage, Warning, WarningCode,
};
use crate::sections::SectionCompiler;

impl SectionCompiler<'_> {
    /// Explicit quantities are normalized; bare references inherit the
    /// preparation's recorded weight.
    pub(crate) fn resolve_reference(&mut self, node: &ReferenceNode) -> Usage {
        let id = slugify(&node.name);
        if !self.registry.has_ingredient(&id) {
            self.warn(Warning::item(
                WarningCode::UndefinedReference,
                format!("Reference to undefined ingredient '&{}'", node.name),
                &node.name,
            ));
        }
        self.scope.note_use(&node.name);

        let (qty, unit) = quantity_parts(node.quantity.as_ref());
        let mass = match (&qty, qty.as_ref().and_then(Amount::number)) {
            (_, Some(amount)) => {
                self.normalizer
                    .normalize(amount, unit.as_deref().unwrap_or_default(), &node.name)
            }
            (None, None) => self
                .scope
                .variable_weights
                .get(&id)
                .map(|weight| MassEstimate {
                    mass: weight.mass,
                    method: ConversionMethod::Variable,
                    is_estimate: weight.is_partial,
                }),
            (Some(_), None) => None,
        };

        Usage::Reference(ReferenceUsage {
            id,
            name: node.name.clone(),
            qty,
            unit,
            mass,
        })
    }

    /// `=> name`: the current step produces this preparation
    pub(crate) fn declare_step_intermediate(&mut self, name: &str) {
        let id = slugify(name);
        self.registry.intern_ingredient(&id, name, None).is_intermediate = true;
        self.scope.defined_intermediates.insert(name.to_string());
        self.scope.open_intermediate = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use crate::ingredients::BuiltinIngredients;
    use crate::mass::Normalizer;
    use crate::model::{ConversionMethod, StepBlock, StepContent, Usage, WarningCode};
    use crate::sections::{CompiledSections, compile_sections};
    use gram_core::Overrides;
    use gram_core::document::Recipe;
    use serde_json::{Value, json};

    fn compile(children: Value) -> CompiledSections {
        let recipe =
            Recipe::from_value(json!({"type": "Recipe", "children": children})).unwrap();
        let overrides = Overrides::new();
        compile_sections(&recipe.children, Normalizer::new(&overrides, &BuiltinIngredients))
    }

    fn reference_in(compiled: &CompiledSections, section: usize) -> &crate::model::ReferenceUsage {
        let StepBlock::Step(step) = &compiled.sections[section].steps[0] else {
            panic!("Expected step");
        };
        step.content
            .iter()
            .find_map(|c| match c {
                StepContent::Usage(Usage::Reference(r)) => Some(r),
                _ => None,
            })
            .expect("reference in step")
    }

    #[test]
    fn test_reference_inherits_preparation_weight() {
        let compiled = compile(json!([
            {"type": "Section", "title": "Dough", "intermediateDecl": {"name": "dough"}, "children": [
                {"type": "Step", "children": [
                    {"type": "Ingredient", "name": "flour", "modifiers": [],
                     "quantity": {"type": "Quantity", "value": {"type": "single", "value": 500}, "unit": "g"}}
                ]}
            ]},
            {"type": "Section", "title": "Bake", "children": [
                {"type": "Step", "children": [{"type": "Reference", "name": "dough"}]}
            ]}
        ]));

        let reference = reference_in(&compiled, 1);
        let mass = reference.mass.unwrap();
        assert_eq!(mass.mass, 500.0);
        assert_eq!(mass.method, ConversionMethod::Variable);
        assert!(!mass.is_estimate);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_reference_with_explicit_quantity() {
        let compiled = compile(json!([
            {"type": "Section", "title": "A", "children": [
                {"type": "Step", "children": [
                    {"type": "Ingredient", "name": "milk", "modifiers": []},
                    {"type": "Reference", "name": "milk",
                     "quantity": {"type": "Quantity", "value": {"type": "single", "value": 1}, "unit": "kg"}}
                ]}
            ]}
        ]));

        let reference = reference_in(&compiled, 0);
        assert_eq!(reference.mass.map(|m| m.mass), Some(1000.0));
        assert_eq!(reference.unit.as_deref(), Some("kg"));
    }

    #[test]
    fn test_undefined_reference() {
        let compiled = compile(json!([
            {"type": "Step", "children": [{"type": "Reference", "name": "ganache"}]}
        ]));
        assert_eq!(compiled.warnings[0].code, WarningCode::UndefinedReference);
        assert!(reference_in(&compiled, 0).mass.is_none());
    }
}
