//! Mass normalization
//!
//! Converts an `(amount, unit, ingredient)` triple into grams. The first
//! matching branch wins:
//!
//! ```text
//! mass unit    ──▶ amount × factor                         physical
//! volume unit  ──▶ ml × override density                   explicit
//!              ──▶ ml × table density                      density     (estimate)
//!              ──▶ ml × 1.0                                default     (estimate)
//! anything else──▶ amount × override grams per item        explicit
//!              ──▶ amount × table unit weight              unit_weight (estimate)
//!              ──▶ none
//! ```

use gram_core::Overrides;

use crate::ingredients::IngredientSource;
use crate::model::{ConversionMethod, MassEstimate};
use crate::units::{UnitClass, classify};

/// Water, in g/ml
const DEFAULT_DENSITY: f64 = 1.0;

/// Normalize a quantity to grams.
///
/// `ingredient` is the display name used for override and table lookups.
pub fn normalize_mass(
    amount: f64,
    unit: &str,
    ingredient: Option<&str>,
    overrides: &Overrides,
    source: &dyn IngredientSource,
) -> Option<MassEstimate> {
    let override_value = ingredient.and_then(|name| overrides.get(name));
    let data = ingredient.and_then(|name| source.lookup(name));

    match classify(unit) {
        UnitClass::Mass(factor) => Some(estimate(amount * factor, ConversionMethod::Physical)),
        UnitClass::Volume(factor) => {
            let millilitres = amount * factor;
            if let Some(density) = override_value {
                return Some(estimate(millilitres * density, ConversionMethod::Explicit));
            }
            match data.and_then(|d| d.density) {
                Some(density) => Some(estimate(millilitres * density, ConversionMethod::Density)),
                None => Some(estimate(millilitres * DEFAULT_DENSITY, ConversionMethod::Default)),
            }
        }
        UnitClass::Count | UnitClass::Other => {
            if let Some(grams) = override_value {
                return Some(estimate(amount * grams, ConversionMethod::Explicit));
            }
            data.and_then(|d| d.unit_weight)
                .map(|weight| estimate(amount * weight, ConversionMethod::UnitWeight))
        }
    }
}

fn estimate(mass: f64, method: ConversionMethod) -> MassEstimate {
    let is_estimate = matches!(
        method,
        ConversionMethod::Density | ConversionMethod::Default | ConversionMethod::UnitWeight
    );
    MassEstimate {
        mass,
        method,
        is_estimate,
    }
}

/// Overrides and lookup service bound together for one compile
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    overrides: &'a Overrides,
    source: &'a dyn IngredientSource,
}

impl<'a> Normalizer<'a> {
    /// Bind overrides to a lookup service
    pub fn new(overrides: &'a Overrides, source: &'a dyn IngredientSource) -> Self {
        Self { overrides, source }
    }

    /// Normalize a quantity of the named ingredient
    pub fn normalize(&self, amount: f64, unit: &str, ingredient: &str) -> Option<MassEstimate> {
        normalize_mass(amount, unit, Some(ingredient), self.overrides, self.source)
    }

    /// The lookup service
    pub fn source(&self) -> &'a dyn IngredientSource {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::{BuiltinIngredients, IngredientTable};
    use rstest::rstest;

    fn builtin(amount: f64, unit: &str, name: &str) -> Option<MassEstimate> {
        normalize_mass(amount, unit, Some(name), &Overrides::new(), &BuiltinIngredients)
    }

    #[rstest]
    #[case(250.0, "g", 250.0)]
    #[case(1.5, "kg", 1500.0)]
    #[case(500.0, "mg", 0.5)]
    #[case(2.0, "oz", 2.0 * 28.349523125)]
    #[case(1.0, "pounds", 453.59237)]
    fn test_mass_units_are_physical(#[case] amount: f64, #[case] unit: &str, #[case] grams: f64) {
        let result = builtin(amount, unit, "anything").unwrap();
        assert_eq!(result.mass, grams);
        assert_eq!(result.method, ConversionMethod::Physical);
        assert!(!result.is_estimate);
    }

    #[test]
    fn test_volume_uses_table_density() {
        let result = builtin(100.0, "ml", "flour").unwrap();
        assert_eq!(result.mass, 100.0 * 0.53);
        assert_eq!(result.method, ConversionMethod::Density);
        assert!(result.is_estimate);
    }

    #[test]
    fn test_volume_defaults_to_water() {
        let result = builtin(2.0, "cup", "mystery broth").unwrap();
        assert_eq!(result.mass, 2.0 * 236.5882365);
        assert_eq!(result.method, ConversionMethod::Default);
        assert!(result.is_estimate);
    }

    #[test]
    fn test_volume_override_wins() {
        let mut overrides = Overrides::new();
        overrides.insert("Flour", 0.6);
        let result =
            normalize_mass(1.0, "tbsp", Some("flour"), &overrides, &BuiltinIngredients).unwrap();
        assert_eq!(result.mass, 14.78676478125 * 0.6);
        assert_eq!(result.method, ConversionMethod::Explicit);
        assert!(!result.is_estimate);
    }

    #[test]
    fn test_count_uses_unit_weight() {
        let result = builtin(3.0, "", "eggs").unwrap();
        assert_eq!(result.mass, 165.0);
        assert_eq!(result.method, ConversionMethod::UnitWeight);
        assert!(result.is_estimate);

        let result = builtin(2.0, "pieces", "lemon").unwrap();
        assert_eq!(result.mass, 240.0);
    }

    #[test]
    fn test_unknown_unit_is_a_count() {
        let result = builtin(2.0, "clove", "garlic").unwrap();
        assert_eq!(result.mass, 10.0);
        assert_eq!(result.method, ConversionMethod::UnitWeight);
    }

    #[test]
    fn test_unknown_unit_without_data_fails() {
        assert!(builtin(2.0, "clove", "elephant garlic").is_none());
        assert!(builtin(1.0, "", "flour").is_none());
    }

    #[test]
    fn test_count_override() {
        let mut overrides = Overrides::new();
        overrides.insert("egg", 60.0);
        let result = normalize_mass(2.0, "", Some("egg"), &overrides, &BuiltinIngredients).unwrap();
        assert_eq!(result.mass, 120.0);
        assert_eq!(result.method, ConversionMethod::Explicit);
    }

    #[test]
    fn test_normalizer_with_custom_table() {
        let table = IngredientTable::from_csv_str("name,density,unit_weight\nquince,0.8,200\n", "t")
            .unwrap();
        let overrides = Overrides::new();
        let normalizer = Normalizer::new(&overrides, &table);

        assert_eq!(normalizer.normalize(2.0, "", "quince").map(|m| m.mass), Some(400.0));
        assert_eq!(normalizer.normalize(10.0, "ml", "quince").map(|m| m.mass), Some(8.0));
        assert!(normalizer.normalize(1.0, "", "egg").is_none());
    }
}
