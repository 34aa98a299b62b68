//! Shopping list aggregation
//!
//! Merges ingredient usages from every section into one list:
//!
//! - **standard** entries, one per identity, with physical masses summed into
//!   grams and everything else kept per unit or as display strings
//! - **composite** entries, one per parent (egg for egg whites and yolks),
//!   buying enough parents for the most demanding part
//! - **alternative** groups, passed through untouched

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::graph::detect_cycles;
use crate::mass::Normalizer;
use crate::model::{
    AlternativeUsage, ConversionMethod, ItemUsage, MassEstimate, Registry, Section, StepBlock,
    StepContent, Usage, format_number, round2,
};

/// Shown for usages caught in a dependency cycle
pub const CIRCULAR_MARKER: &str = "⚠️ Circular reference";

/// One line of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShoppingItem {
    /// Single ingredient merged across usages
    Ingredient(ShoppingEntry),
    /// Parent item bought for its parts
    Composite(CompositeEntry),
    /// Choice between options, not summed
    Alternative(AlternativeUsage),
}

/// Merged ingredient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingEntry {
    /// Identity
    pub id: String,
    /// Registry display name
    pub name: String,
    /// Main quantity (grams when any physical mass was found)
    pub qty: Option<f64>,
    /// Unit of `qty`
    pub unit: Option<String>,
    /// Other units, unresolved formulas and free-text quantities
    pub variable_entries: Vec<String>,
    /// Sum of every known mass, estimates included
    #[serde(rename = "normalizedMass")]
    pub normalized_mass: Option<f64>,
    /// Some part of `normalizedMass` is estimated
    #[serde(rename = "isEstimate", skip_serializing_if = "std::ops::Not::not")]
    pub is_estimate: bool,
    /// Part of a dependency cycle
    #[serde(rename = "isCircular", skip_serializing_if = "std::ops::Not::not")]
    pub is_circular: bool,
}

/// Parent of composite parts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeEntry {
    /// Parent identity
    pub id: String,
    /// Parent display name
    pub name: String,
    /// Parents to buy
    pub qty: f64,
    /// Mass of the parents, as a count
    #[serde(flatten)]
    pub mass: Option<MassEstimate>,
    /// Part usages merged per identity and unit
    pub usage: Vec<CompositePart>,
}

/// Merged usage of one composite part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositePart {
    /// Part identity
    pub id: String,
    /// Part display name
    pub name: String,
    /// Summed quantity
    pub qty: f64,
    /// Unit
    pub unit: Option<String>,
    /// Alias of the first usage
    pub alias: Option<String>,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    name: String,
    sure_mass: f64,
    other_units: IndexMap<String, f64>,
    variable_parts: Vec<String>,
    normalized_total: f64,
    has_normalized: bool,
    is_estimate: bool,
    is_circular: bool,
}

impl EntryBuilder {
    fn add(&mut self, usage: &ItemUsage) {
        if let Some(formula) = usage.formula.as_ref().filter(|f| f.is_ghost) {
            self.variable_parts.push(format!("({} ❓)", formula.raw));
        } else if let Some(amount) = usage.qty.as_ref().and_then(|q| q.number()) {
            match usage.mass {
                Some(mass) if mass.method == ConversionMethod::Physical => self.sure_mass += mass.mass,
                _ => {
                    let unit = usage.unit.clone().unwrap_or_default();
                    *self.other_units.entry(unit).or_default() += amount;
                }
            }
        } else if let Some(qty) = &usage.qty {
            self.variable_parts.push(with_unit(&qty.display(), usage.unit.as_deref()));
        }

        if usage.is_circular {
            self.is_circular = true;
            if !usage.is_ghost() {
                self.variable_parts.push(CIRCULAR_MARKER.to_string());
            }
        }

        if let Some(mass) = usage.known_mass() {
            self.normalized_total += mass.mass;
            self.has_normalized = true;
            self.is_estimate |= mass.is_estimate;
        }
    }

    fn build(self, id: String) -> ShoppingEntry {
        let mut others = self
            .other_units
            .into_iter()
            .map(|(unit, qty)| (unit, round2(qty)));

        let (qty, unit) = if self.sure_mass > 0.0 {
            (Some(round2(self.sure_mass)), Some("g".to_string()))
        } else {
            match others.next() {
                Some((unit, qty)) => (Some(qty), Some(unit).filter(|u| !u.is_empty())),
                None => (None, None),
            }
        };

        let mut variable_entries: Vec<String> = others
            .map(|(unit, qty)| with_unit(&format_number(qty), Some(&unit)))
            .collect();
        variable_entries.extend(self.variable_parts);

        ShoppingEntry {
            id,
            name: self.name,
            qty,
            unit,
            variable_entries,
            normalized_mass: self.has_normalized.then(|| round2(self.normalized_total)),
            is_estimate: self.is_estimate,
            is_circular: self.is_circular,
        }
    }
}

#[derive(Debug, Default)]
struct CompositeBuilder {
    name: String,
    parent_per_part: IndexMap<String, f64>,
    parts: IndexMap<(String, String), CompositePart>,
}

impl CompositeBuilder {
    fn add(&mut self, usage: &ItemUsage) {
        let declared = usage
            .composite
            .as_ref()
            .and_then(|c| c.quantity.as_ref())
            .and_then(|q| q.number())
            .unwrap_or_default();
        *self.parent_per_part.entry(usage.id.clone()).or_default() += declared;

        let unit = usage.unit.clone().unwrap_or_default();
        let part = self
            .parts
            .entry((usage.id.clone(), unit))
            .or_insert_with(|| CompositePart {
                id: usage.id.clone(),
                name: usage.name.clone(),
                qty: 0.0,
                unit: usage.unit.clone(),
                alias: usage.alias.clone(),
            });
        part.qty += usage.qty.as_ref().and_then(|q| q.number()).unwrap_or_default();
    }

    fn build(self, id: String, normalizer: &Normalizer<'_>) -> CompositeEntry {
        // Each parent yields every part, so buy for the most demanding one
        let qty = self.parent_per_part.values().copied().fold(0.0, f64::max);
        CompositeEntry {
            mass: normalizer.normalize(qty, "", &self.name),
            id,
            name: self.name,
            qty,
            usage: self.parts.into_values().collect(),
        }
    }
}

fn with_unit(quantity: &str, unit: Option<&str>) -> String {
    match unit.filter(|u| !u.is_empty()) {
        Some(unit) => format!("{} {}", quantity, unit),
        None => quantity.to_string(),
    }
}

/// Build the shopping list.
///
/// Runs cycle detection first and flags the usages involved, in the section
/// lists and in step content alike.
pub fn generate_shopping_list(
    sections: &mut [Section],
    registry: &Registry,
    normalizer: &Normalizer<'_>,
) -> Vec<ShoppingItem> {
    let circular = detect_cycles(sections);
    if !circular.is_empty() {
        flag_circular(sections, &circular);
    }

    let mut standard: IndexMap<String, EntryBuilder> = IndexMap::new();
    let mut composites: IndexMap<String, CompositeBuilder> = IndexMap::new();
    let mut alternatives = Vec::new();

    for section in sections.iter() {
        for usage in &section.ingredients {
            let item = match usage {
                Usage::Alternative(alt) => {
                    alternatives.push(ShoppingItem::Alternative(alt.clone()));
                    continue;
                }
                Usage::Ingredient(item) => item,
                _ => continue,
            };

            if let Some(composite) = &item.composite {
                let parent_id = gram_core::slugify(&composite.parent);
                composites
                    .entry(parent_id.clone())
                    .or_insert_with(|| CompositeBuilder {
                        name: registry
                            .ingredient_name(&parent_id)
                            .unwrap_or(&composite.parent)
                            .to_string(),
                        ..Default::default()
                    })
                    .add(item);
                continue;
            }

            standard
                .entry(item.id.clone())
                .or_insert_with(|| EntryBuilder {
                    name: registry
                        .ingredient_name(&item.id)
                        .unwrap_or(&item.name)
                        .to_string(),
                    ..Default::default()
                })
                .add(item);
        }
    }

    tracing::debug!(
        "Shopping list: {} standard, {} composite, {} alternative",
        standard.len(),
        composites.len(),
        alternatives.len()
    );

    standard
        .into_iter()
        .map(|(id, entry)| ShoppingItem::Ingredient(entry.build(id)))
        .chain(
            composites
                .into_iter()
                .map(|(id, entry)| ShoppingItem::Composite(entry.build(id, normalizer))),
        )
        .chain(alternatives)
        .collect()
}

fn flag_circular(sections: &mut [Section], circular: &BTreeSet<String>) {
    fn flag(usage: &mut Usage, circular: &BTreeSet<String>) {
        match usage {
            Usage::Ingredient(item) if circular.contains(&item.id) => item.is_circular = true,
            Usage::Alternative(alt) => {
                for option in &mut alt.options {
                    flag(option, circular);
                }
            }
            _ => {}
        }
    }

    for section in sections {
        for usage in &mut section.ingredients {
            flag(usage, circular);
        }
        for block in &mut section.steps {
            if let StepBlock::Step(step) = block {
                for content in &mut step.content {
                    if let StepContent::Usage(usage) = content {
                        flag(usage, circular);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::BuiltinIngredients;
    use crate::model::{Amount, CompositeRef, Formula};
    use gram_core::Overrides;

    fn section(ingredients: Vec<Usage>) -> Section {
        Section {
            title: None,
            ingredients,
            cookware: vec![],
            steps: vec![],
            intermediate_preparation: None,
            retro_planning: None,
            metrics: None,
        }
    }

    fn measured(id: &str, qty: f64, unit: &str, normalizer: &Normalizer<'_>) -> Usage {
        let mut usage = ItemUsage::new(id, id);
        usage.qty = Some(Amount::Number(qty));
        usage.unit = Some(unit.to_string()).filter(|u| !u.is_empty());
        usage.mass = normalizer.normalize(qty, unit, id);
        Usage::Ingredient(usage)
    }

    fn part(id: &str, qty: f64, parent_qty: f64) -> Usage {
        let mut usage = ItemUsage::new(id, id);
        usage.qty = Some(Amount::Number(qty));
        usage.composite = Some(CompositeRef {
            parent: "egg".into(),
            quantity: Some(Amount::Number(parent_qty)),
            unit: None,
        });
        Usage::Ingredient(usage)
    }

    fn shop(sections: &mut [Section]) -> Vec<ShoppingItem> {
        let overrides = Overrides::new();
        let normalizer = Normalizer::new(&overrides, &BuiltinIngredients);
        generate_shopping_list(sections, &Registry::default(), &normalizer)
    }

    fn standard(items: &[ShoppingItem], index: usize) -> &ShoppingEntry {
        match &items[index] {
            ShoppingItem::Ingredient(entry) => entry,
            _ => panic!("Expected standard entry"),
        }
    }

    #[test]
    fn test_physical_masses_merge_into_grams() {
        let overrides = Overrides::new();
        let n = Normalizer::new(&overrides, &BuiltinIngredients);
        let mut sections = vec![
            section(vec![measured("flour", 200.0, "g", &n)]),
            section(vec![measured("flour", 0.3, "kg", &n)]),
        ];

        let items = shop(&mut sections);
        let flour = standard(&items, 0);
        assert_eq!(flour.qty, Some(500.0));
        assert_eq!(flour.unit.as_deref(), Some("g"));
        assert_eq!(flour.normalized_mass, Some(500.0));
        assert!(!flour.is_estimate);
        assert!(flour.variable_entries.is_empty());
    }

    #[test]
    fn test_other_units_become_extra_entries() {
        let overrides = Overrides::new();
        let n = Normalizer::new(&overrides, &BuiltinIngredients);
        let mut sections = vec![section(vec![
            measured("milk", 2.0, "cup", &n),
            measured("milk", 100.0, "ml", &n),
            measured("milk", 1.0, "cup", &n),
        ])];

        let items = shop(&mut sections);
        let milk = standard(&items, 0);
        assert_eq!(milk.qty, Some(3.0));
        assert_eq!(milk.unit.as_deref(), Some("cup"));
        assert_eq!(milk.variable_entries, vec!["100 ml".to_string()]);
        assert!(milk.is_estimate);
    }

    #[test]
    fn test_ghost_and_text_quantities() {
        let mut ghost = ItemUsage::new("water", "water");
        ghost.qty = Some(Amount::Number(0.0));
        ghost.formula = Some(Formula {
            raw: "50% of @flour".into(),
            target: "flour".into(),
            percent: 50.0,
            is_ghost: true,
        });
        let mut pinch = ItemUsage::new("salt", "salt");
        pinch.qty = Some(Amount::Text("a pinch".into()));

        let mut sections = vec![section(vec![Usage::Ingredient(ghost), Usage::Ingredient(pinch)])];
        let items = shop(&mut sections);

        let water = standard(&items, 0);
        assert_eq!(water.qty, None);
        assert_eq!(water.variable_entries, vec!["(50% of @flour ❓)".to_string()]);
        assert_eq!(standard(&items, 1).variable_entries, vec!["a pinch".to_string()]);
    }

    #[test]
    fn test_composite_parent_takes_max() {
        let mut sections = vec![section(vec![
            part("egg-white", 6.0, 6.0),
            part("egg-yolk", 4.0, 4.0),
        ])];

        let items = shop(&mut sections);
        assert_eq!(items.len(), 1);
        match &items[0] {
            ShoppingItem::Composite(egg) => {
                assert_eq!(egg.id, "egg");
                assert_eq!(egg.qty, 6.0);
                assert_eq!(egg.mass.map(|m| m.mass), Some(330.0));
                assert_eq!(egg.usage.len(), 2);
            }
            _ => panic!("Expected composite"),
        }
    }

    #[test]
    fn test_composite_sums_batches_of_one_part() {
        let mut sections = vec![
            section(vec![part("egg-white", 2.0, 2.0)]),
            section(vec![part("egg-white", 3.0, 3.0), part("egg-yolk", 4.0, 4.0)]),
        ];

        let items = shop(&mut sections);
        let ShoppingItem::Composite(egg) = &items[0] else {
            panic!("Expected composite");
        };
        assert_eq!(egg.qty, 5.0);
        assert_eq!(egg.usage[0].qty, 5.0);
    }

    #[test]
    fn test_order_and_alternatives() {
        let overrides = Overrides::new();
        let n = Normalizer::new(&overrides, &BuiltinIngredients);
        let mut sections = vec![section(vec![
            Usage::Alternative(AlternativeUsage::new(vec![measured("butter", 10.0, "g", &n)])),
            part("egg-white", 1.0, 1.0),
            measured("sugar", 10.0, "g", &n),
        ])];

        let items = shop(&mut sections);
        assert!(matches!(items[0], ShoppingItem::Ingredient(_)));
        assert!(matches!(items[1], ShoppingItem::Composite(_)));
        assert!(matches!(items[2], ShoppingItem::Alternative(_)));
    }

    #[test]
    fn test_indirect_cycle_is_flagged() {
        let mut a = ItemUsage::new("a", "a");
        a.qty = Some(Amount::Number(5.0));
        a.unit = Some("g".into());
        a.dependencies = vec!["b".into()];
        let mut b = a.clone();
        b.id = "b".into();
        b.name = "b".into();
        b.dependencies = vec!["a".into()];

        let mut sections = vec![section(vec![Usage::Ingredient(a), Usage::Ingredient(b)])];
        let items = shop(&mut sections);

        assert!(standard(&items, 0).is_circular);
        assert!(standard(&items, 0).variable_entries.contains(&CIRCULAR_MARKER.to_string()));
        assert!(sections[0].ingredients[1].as_ingredient().unwrap().is_circular);
    }
}
