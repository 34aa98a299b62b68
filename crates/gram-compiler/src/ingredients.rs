//! Ingredient physical properties
//!
//! Mass normalization and the nutrition estimate look ingredients up through
//! [`IngredientSource`]. Two sources ship with the crate:
//!
//! - [`BuiltinIngredients`] - a static table of common ingredients
//! - [`IngredientTable`] - rows loaded from a CSV file, optionally falling
//!   back to the built-in table
//!
//! # CSV format
//!
//! ```text
//! name,density,unit_weight,calories,protein,carbs,fat
//! quince,0.8,200,57,0.4,15.3,0.1
//! saffron,,0.02,,,,
//! ```

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Physical properties of an ingredient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientData {
    /// g/ml
    pub density: Option<f64>,
    /// Grams per piece
    pub unit_weight: Option<f64>,
    /// Macros per 100 g
    pub macros: Option<Macros>,
}

/// Macronutrients (per 100 g in tables, absolute in estimates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Macros {
    /// kcal
    pub calories: f64,
    /// Grams of protein
    pub protein: f64,
    /// Grams of carbohydrates
    pub carbs: f64,
    /// Grams of fat
    pub fat: f64,
}

impl Macros {
    const fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }
}

/// Lookup service for ingredient properties
pub trait IngredientSource {
    /// Exact match on a lowercased, trimmed name
    fn exact(&self, key: &str) -> Option<IngredientData>;

    /// Exact match, then a naive singular (trailing `s` stripped)
    fn lookup(&self, name: &str) -> Option<IngredientData> {
        let key = name.trim().to_lowercase();
        self.exact(&key)
            .or_else(|| key.strip_suffix('s').and_then(|singular| self.exact(singular)))
    }
}

// =============================================================================
// Built-in table
// =============================================================================

const fn dense(density: f64, macros: Macros) -> IngredientData {
    IngredientData {
        density: Some(density),
        unit_weight: None,
        macros: Some(macros),
    }
}

const fn piece(density: f64, unit_weight: f64, macros: Macros) -> IngredientData {
    IngredientData {
        density: Some(density),
        unit_weight: Some(unit_weight),
        macros: Some(macros),
    }
}

const fn liquid(density: f64) -> IngredientData {
    IngredientData {
        density: Some(density),
        unit_weight: None,
        macros: None,
    }
}

const FLOUR: IngredientData = dense(0.53, Macros::new(364.0, 10.0, 76.0, 1.0));
const SUGAR: IngredientData = dense(0.85, Macros::new(387.0, 0.0, 100.0, 0.0));
const BROWN_SUGAR: IngredientData = dense(0.93, Macros::new(380.0, 0.0, 98.0, 0.0));
const POWDERED_SUGAR: IngredientData = dense(0.56, Macros::new(389.0, 0.0, 100.0, 0.0));
const BUTTER: IngredientData = dense(0.911, Macros::new(717.0, 0.85, 0.06, 81.0));
const OIL: IngredientData = dense(0.92, Macros::new(884.0, 0.0, 0.0, 100.0));
const MILK: IngredientData = dense(1.03, Macros::new(61.0, 3.2, 4.8, 3.3));
const WATER: IngredientData = dense(1.0, Macros::new(0.0, 0.0, 0.0, 0.0));
const SALT: IngredientData = dense(1.2, Macros::new(0.0, 0.0, 0.0, 0.0));
const YEAST: IngredientData = dense(0.95, Macros::new(325.0, 40.0, 41.0, 7.0));
const BAKING_POWDER: IngredientData = dense(0.9, Macros::new(53.0, 0.0, 28.0, 0.0));
const BAKING_SODA: IngredientData = dense(1.2, Macros::new(0.0, 0.0, 0.0, 0.0));
const COCOA: IngredientData = dense(0.44, Macros::new(228.0, 20.0, 58.0, 14.0));
const HONEY: IngredientData = dense(1.42, Macros::new(304.0, 0.3, 82.0, 0.0));
const MAPLE_SYRUP: IngredientData = dense(1.37, Macros::new(260.0, 0.0, 67.0, 0.0));
const CREAM: IngredientData = dense(1.01, Macros::new(340.0, 2.8, 2.7, 36.0));
const VANILLA: IngredientData = dense(0.88, Macros::new(288.0, 0.0, 13.0, 0.0));
const CORNSTARCH: IngredientData = dense(0.65, Macros::new(381.0, 0.3, 91.0, 0.1));
const ALMOND_FLOUR: IngredientData = dense(0.45, Macros::new(579.0, 21.0, 22.0, 50.0));
const CHOCOLATE: IngredientData = dense(0.7, Macros::new(546.0, 6.0, 61.0, 31.0));
const CHEESE: IngredientData = dense(0.6, Macros::new(403.0, 25.0, 1.3, 33.0));

const EGG: IngredientData = piece(1.03, 55.0, Macros::new(143.0, 12.6, 0.7, 9.5));
const EGG_YOLK: IngredientData = piece(1.03, 18.0, Macros::new(322.0, 16.0, 3.6, 27.0));
const EGG_WHITE: IngredientData = piece(1.03, 33.0, Macros::new(52.0, 11.0, 0.7, 0.2));
const LEMON: IngredientData = piece(1.0, 120.0, Macros::new(29.0, 1.1, 9.0, 0.3));
const LEMON_JUICE: IngredientData = piece(1.04, 45.0, Macros::new(22.0, 0.35, 6.9, 0.2));
const LEMON_ZEST: IngredientData = piece(0.5, 3.0, Macros::new(47.0, 1.5, 16.0, 0.3));
const LIME: IngredientData = piece(1.0, 60.0, Macros::new(30.0, 0.7, 11.0, 0.2));
const ONION: IngredientData = piece(0.7, 150.0, Macros::new(40.0, 1.1, 9.3, 0.1));
const GARLIC: IngredientData = piece(0.6, 5.0, Macros::new(149.0, 6.4, 33.0, 0.5));
const CARROT: IngredientData = piece(0.7, 100.0, Macros::new(41.0, 0.9, 9.6, 0.2));
const POTATO: IngredientData = piece(0.77, 200.0, Macros::new(77.0, 2.0, 17.0, 0.1));
const APPLE: IngredientData = piece(0.6, 180.0, Macros::new(52.0, 0.3, 14.0, 0.2));
const BANANA: IngredientData = piece(0.9, 120.0, Macros::new(89.0, 1.1, 23.0, 0.3));
const TOMATO: IngredientData = piece(0.95, 120.0, Macros::new(18.0, 0.9, 3.9, 0.2));
const CANNED_TOMATO: IngredientData = dense(1.1, Macros::new(32.0, 1.6, 7.3, 0.3));
const BELL_PEPPER: IngredientData = piece(0.5, 150.0, Macros::new(26.0, 1.0, 6.0, 0.3));
const CHILI: IngredientData = piece(0.5, 15.0, Macros::new(40.0, 1.9, 9.0, 0.4));
const GINGER: IngredientData = piece(0.9, 30.0, Macros::new(80.0, 1.8, 18.0, 0.8));
const SPINACH: IngredientData = piece(0.1, 300.0, Macros::new(23.0, 2.9, 3.6, 0.4));

const CHICKEN: IngredientData = piece(1.05, 200.0, Macros::new(165.0, 31.0, 0.0, 3.6));
const CHICKEN_THIGH: IngredientData = piece(1.05, 120.0, Macros::new(209.0, 26.0, 0.0, 10.9));
const BEEF: IngredientData = dense(1.05, Macros::new(250.0, 26.0, 0.0, 17.0));
const PORK: IngredientData = piece(1.05, 150.0, Macros::new(242.0, 27.0, 0.0, 14.0));
const BACON: IngredientData = dense(0.5, Macros::new(541.0, 37.0, 1.4, 42.0));
const TOFU: IngredientData = dense(0.95, Macros::new(76.0, 8.1, 1.9, 4.8));

const PEPPER: IngredientData = dense(0.5, Macros::new(251.0, 10.0, 64.0, 3.3));
const CINNAMON: IngredientData = dense(0.55, Macros::new(247.0, 4.0, 81.0, 1.2));
const PAPRIKA: IngredientData = dense(0.45, Macros::new(282.0, 14.0, 54.0, 13.0));
const CUMIN: IngredientData = dense(0.45, Macros::new(375.0, 18.0, 44.0, 22.0));
const TURMERIC: IngredientData = dense(0.6, Macros::new(354.0, 8.0, 65.0, 10.0));

const STOCK: IngredientData = dense(1.01, Macros::new(15.0, 2.0, 1.0, 0.5));
const MAYONNAISE: IngredientData = dense(0.92, Macros::new(680.0, 1.0, 1.0, 75.0));
const MUSTARD: IngredientData = dense(1.05, Macros::new(66.0, 4.0, 8.0, 4.0));
const KETCHUP: IngredientData = dense(1.15, Macros::new(111.0, 1.0, 26.0, 0.0));

const RICE: IngredientData = dense(0.85, Macros::new(360.0, 7.0, 80.0, 0.7));
const BASMATI_RICE: IngredientData = dense(0.85, Macros::new(350.0, 8.0, 77.0, 0.5));
const OATS: IngredientData = dense(0.4, Macros::new(389.0, 17.0, 66.0, 7.0));
const PASTA: IngredientData = dense(1.3, Macros::new(371.0, 13.0, 75.0, 1.5));

const WINE: IngredientData = liquid(0.99);
const VINEGAR: IngredientData = liquid(1.01);
const SOY_SAUCE: IngredientData = liquid(1.13);

/// Names and synonyms → properties
static BUILTIN: phf::Map<&'static str, IngredientData> = phf_map! {
    // baking
    "flour" => FLOUR, "all-purpose flour" => FLOUR, "wheat flour" => FLOUR,
    "sugar" => SUGAR, "white sugar" => SUGAR, "granulated sugar" => SUGAR,
    "brown sugar" => BROWN_SUGAR,
    "powdered sugar" => POWDERED_SUGAR, "icing sugar" => POWDERED_SUGAR,
    "butter" => BUTTER,
    "oil" => OIL, "vegetable oil" => OIL, "olive oil" => OIL,
    "milk" => MILK, "whole milk" => MILK,
    "water" => WATER,
    "salt" => SALT, "sea salt" => SALT,
    "yeast" => YEAST, "active dry yeast" => YEAST,
    "baking powder" => BAKING_POWDER,
    "baking soda" => BAKING_SODA,
    "cocoa powder" => COCOA, "cocoa" => COCOA,
    "honey" => HONEY,
    "maple syrup" => MAPLE_SYRUP,
    "cream" => CREAM, "heavy cream" => CREAM,
    "vanilla extract" => VANILLA,
    "cornstarch" => CORNSTARCH, "corn flour" => CORNSTARCH,
    "almond flour" => ALMOND_FLOUR, "ground almonds" => ALMOND_FLOUR,
    "chocolate chips" => CHOCOLATE, "chocolate" => CHOCOLATE,
    "cheese" => CHEESE, "cheddar" => CHEESE,
    // produce
    "egg" => EGG, "eggs" => EGG,
    "egg yolk" => EGG_YOLK, "egg yolks" => EGG_YOLK, "yolk" => EGG_YOLK, "yolks" => EGG_YOLK,
    "egg white" => EGG_WHITE, "egg whites" => EGG_WHITE, "white" => EGG_WHITE, "whites" => EGG_WHITE,
    "lemon" => LEMON, "lemons" => LEMON,
    "lemon juice" => LEMON_JUICE, "juice" => LEMON_JUICE,
    "lemon zest" => LEMON_ZEST, "zest" => LEMON_ZEST,
    "lime" => LIME, "limes" => LIME,
    "onion" => ONION, "onions" => ONION, "yellow onion" => ONION,
    "red onion" => ONION, "red onions" => ONION,
    "garlic" => GARLIC, "garlic clove" => GARLIC, "garlic cloves" => GARLIC,
    "carrot" => CARROT, "carrots" => CARROT,
    "potato" => POTATO, "potatoes" => POTATO, "russet potato" => POTATO,
    "apple" => APPLE, "apples" => APPLE,
    "banana" => BANANA, "bananas" => BANANA,
    "tomato" => TOMATO, "tomatoes" => TOMATO,
    "canned tomatoes" => CANNED_TOMATO, "canned tomato" => CANNED_TOMATO,
    "bell pepper" => BELL_PEPPER, "red bell pepper" => BELL_PEPPER, "green bell pepper" => BELL_PEPPER,
    "chili" => CHILI, "chili pepper" => CHILI, "espelette pepper" => CHILI,
    "ginger" => GINGER,
    "spinach" => SPINACH,
    // meat and protein
    "chicken" => CHICKEN, "chicken breast" => CHICKEN,
    "chicken thigh" => CHICKEN_THIGH, "chicken thighs" => CHICKEN_THIGH,
    "beef" => BEEF, "ground beef" => BEEF, "steak" => BEEF,
    "pork" => PORK, "pork chop" => PORK,
    "bacon" => BACON,
    "tofu" => TOFU,
    // spices
    "pepper" => PEPPER, "black pepper" => PEPPER, "ground pepper" => PEPPER,
    "cinnamon" => CINNAMON,
    "paprika" => PAPRIKA,
    "cumin" => CUMIN,
    "turmeric" => TURMERIC,
    // stocks and sauces
    "stock" => STOCK, "chicken stock" => STOCK, "beef stock" => STOCK,
    "vegetable stock" => STOCK, "broth" => STOCK,
    "mayonnaise" => MAYONNAISE,
    "mustard" => MUSTARD,
    "ketchup" => KETCHUP,
    // grains
    "rice" => RICE,
    "basmati rice" => BASMATI_RICE,
    "oats" => OATS, "rolled oats" => OATS,
    "pasta" => PASTA, "spaghetti" => PASTA,
    // liquids
    "wine" => WINE, "red wine" => WINE, "white wine" => WINE,
    "vinegar" => VINEGAR,
    "soy sauce" => SOY_SAUCE,
};

/// The built-in table of common ingredients
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIngredients;

impl IngredientSource for BuiltinIngredients {
    fn exact(&self, key: &str) -> Option<IngredientData> {
        BUILTIN.get(key).copied()
    }
}

// =============================================================================
// CSV table
// =============================================================================

#[derive(Debug, Deserialize)]
struct TableRow {
    name: String,
    #[serde(default)]
    density: Option<f64>,
    #[serde(default)]
    unit_weight: Option<f64>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    protein: Option<f64>,
    #[serde(default)]
    carbs: Option<f64>,
    #[serde(default)]
    fat: Option<f64>,
}

impl TableRow {
    fn into_data(self) -> (String, IngredientData) {
        let macros = self.calories.map(|calories| Macros {
            calories,
            protein: self.protein.unwrap_or_default(),
            carbs: self.carbs.unwrap_or_default(),
            fat: self.fat.unwrap_or_default(),
        });
        let data = IngredientData {
            density: self.density,
            unit_weight: self.unit_weight,
            macros,
        };
        (self.name.trim().to_lowercase(), data)
    }
}

/// Ingredient properties loaded from CSV
#[derive(Debug, Clone, Default)]
pub struct IngredientTable {
    entries: HashMap<String, IngredientData>,
    fallback: Option<BuiltinIngredients>,
}

impl IngredientTable {
    /// Parse CSV text; `source` names the table in errors
    pub fn from_csv_str(csv: &str, source: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());

        let mut entries = HashMap::new();
        for (index, row) in reader.deserialize::<TableRow>().enumerate() {
            let (name, data) = row?.into_data();
            if name.is_empty() {
                return Err(Error::IngredientTable {
                    path: source.to_string(),
                    message: format!("row {} has an empty name", index + 1),
                });
            }
            if data.density.is_some_and(|d| d <= 0.0) || data.unit_weight.is_some_and(|w| w <= 0.0) {
                return Err(Error::IngredientTable {
                    path: source.to_string(),
                    message: format!("'{}' has a non-positive density or unit weight", name),
                });
            }
            entries.insert(name, data);
        }

        tracing::debug!("Loaded {} ingredient rows from {}", entries.len(), source);
        Ok(Self {
            entries,
            fallback: None,
        })
    }

    /// Load a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_csv_str(&contents, &path.display().to_string())
    }

    /// Fall back to the built-in table for names this table lacks
    pub fn with_builtin_fallback(mut self) -> Self {
        self.fallback = Some(BuiltinIngredients);
        self
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IngredientSource for IngredientTable {
    fn exact(&self, key: &str) -> Option<IngredientData> {
        self.entries
            .get(key)
            .copied()
            .or_else(|| self.fallback.and_then(|builtin| builtin.exact(key)))
    }
}
