//! Unit tables and canonicalization
//!
//! Units are matched after canonicalization: lowercase, trimmed, trailing
//! periods stripped, inner whitespace collapsed, then resolved through
//! [`SYNONYMS`]. Only canonical spellings appear in the factor tables.

use phf::{phf_map, phf_set};

/// Grams per unit
static MASS_FACTORS: phf::Map<&'static str, f64> = phf_map! {
    "g" => 1.0,
    "kg" => 1000.0,
    "mg" => 0.001,
    "oz" => 28.349523125,
    "lb" => 453.59237,
};

/// Millilitres per unit
static VOLUME_FACTORS: phf::Map<&'static str, f64> = phf_map! {
    "ml" => 1.0,
    "cl" => 10.0,
    "dl" => 100.0,
    "l" => 1000.0,
    "tsp" => 4.92892159375,
    "tbsp" => 14.78676478125,
    "floz" => 29.5735295625,
    "cup" => 236.5882365,
    "pint" => 473.176473,
    "quart" => 946.352946,
    "gallon" => 3785.411784,
};

/// Words that mean "one item"
static COUNT_UNITS: phf::Set<&'static str> = phf_set! {
    "unit", "piece", "each", "whole", "item",
};

/// Alternative spellings → canonical unit
static SYNONYMS: phf::Map<&'static str, &'static str> = phf_map! {
    // mass
    "gram" => "g", "grams" => "g", "gramme" => "g", "grammes" => "g", "gr" => "g",
    "kilogram" => "kg", "kilograms" => "kg", "kilogramme" => "kg", "kilogrammes" => "kg", "kgs" => "kg",
    "milligram" => "mg", "milligrams" => "mg", "milligramme" => "mg",
    "ounce" => "oz", "ounces" => "oz",
    "lbs" => "lb", "pound" => "lb", "pounds" => "lb",
    // volume
    "milliliter" => "ml", "milliliters" => "ml", "millilitre" => "ml", "millilitres" => "ml", "mls" => "ml",
    "centiliter" => "cl", "centiliters" => "cl", "centilitre" => "cl", "centilitres" => "cl",
    "deciliter" => "dl", "deciliters" => "dl", "decilitre" => "dl", "decilitres" => "dl",
    "liter" => "l", "liters" => "l", "litre" => "l", "litres" => "l",
    "teaspoon" => "tsp", "teaspoons" => "tsp", "tsps" => "tsp",
    "tablespoon" => "tbsp", "tablespoons" => "tbsp", "tbs" => "tbsp", "tbl" => "tbsp", "tbsps" => "tbsp",
    "fl oz" => "floz", "fl. oz" => "floz", "fluid ounce" => "floz", "fluid ounces" => "floz",
    "cups" => "cup",
    "pints" => "pint", "pt" => "pint",
    "quarts" => "quart", "qt" => "quart",
    "gallons" => "gallon", "gal" => "gallon",
    // count
    "units" => "unit", "pieces" => "piece", "pc" => "piece", "pcs" => "piece",
    "items" => "item",
};

/// How a canonical unit converts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitClass {
    /// Mass unit; grams per unit
    Mass(f64),
    /// Volume unit; millilitres per unit
    Volume(f64),
    /// No unit, or a counting word
    Count,
    /// Anything else ("clove", "stick"); treated as an implicit count
    Other,
}

/// Canonical spelling of a unit
pub fn canonical_unit(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered.trim_end_matches('.').trim_end();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    match SYNONYMS.get(collapsed.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => collapsed,
    }
}

/// Classify a unit as written
pub fn classify(raw: &str) -> UnitClass {
    let unit = canonical_unit(raw);
    if unit.is_empty() || COUNT_UNITS.contains(unit.as_str()) {
        return UnitClass::Count;
    }
    if let Some(factor) = MASS_FACTORS.get(unit.as_str()) {
        return UnitClass::Mass(*factor);
    }
    if let Some(factor) = VOLUME_FACTORS.get(unit.as_str()) {
        return UnitClass::Volume(*factor);
    }
    UnitClass::Other
}

/// Grams per unit for a mass unit
pub fn mass_factor(raw: &str) -> Option<f64> {
    MASS_FACTORS.get(canonical_unit(raw).as_str()).copied()
}

/// Millilitres per unit for a volume unit
pub fn volume_factor(raw: &str) -> Option<f64> {
    VOLUME_FACTORS.get(canonical_unit(raw).as_str()).copied()
}

/// Convert a duration to minutes; unknown or missing units count as minutes
pub fn to_minutes(amount: f64, unit: Option<&str>) -> f64 {
    let unit = unit.map(|u| u.trim().trim_end_matches('.').to_lowercase());
    match unit.as_deref() {
        Some("h" | "hr" | "hrs" | "hour" | "hours" | "heure" | "heures") => amount * 60.0,
        Some("s" | "sec" | "secs" | "second" | "seconds" | "seconde" | "secondes") => amount / 60.0,
        _ => amount,
    }
}

/// Display unit for timers (`m` and `minutes` read as `min`)
pub fn timer_display_unit(unit: &str) -> &str {
    match unit {
        "m" | "minutes" => "min",
        other => other,
    }
}
