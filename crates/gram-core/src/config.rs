//! Configuration parsing
//!
//! Two layers feed the compiler:
//!
//! - `gram.yaml` - optional project file (ingredient table, global densities)
//! - recipe metadata - per-recipe `densities` entries, which win over the
//!   project file
//!
//! # Example
//!
//! ```yaml
//! ingredients: data/ingredients.csv
//! extend_builtin: true
//! densities:
//!   flour: 0.55
//! pretty: true
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::document::{Meta, MetaValue};
use crate::error::{Error, Result};
use crate::ident::slugify;

/// Metadata key holding density / unit-weight overrides
pub const DENSITIES_KEY: &str = "densities";

/// Default project file name
pub const CONFIG_FILE: &str = "gram.yaml";

/// `"<ingredient-name>: <number>"`; anything after the number is ignored.
static OVERRIDE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:]+):\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))[^:]*$").expect("valid override regex")
});

/// Per-recipe overrides keyed by ingredient identity.
///
/// One number per ingredient, read as g/ml when the quantity is a volume and as
/// grams per item when it is a count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<String, f64>);

impl Overrides {
    /// Empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `densities` metadata entry (string or list of strings).
    ///
    /// Malformed entries are skipped.
    pub fn from_meta(meta: &Meta) -> Self {
        let mut overrides = Self::new();
        let Some(value) = meta.get(DENSITIES_KEY) else {
            return overrides;
        };

        for entry in value.entries() {
            match parse_entry(&entry) {
                Some((name, number)) => overrides.insert(&name, number),
                None => tracing::debug!("Ignoring malformed density entry '{}'", entry),
            }
        }
        overrides
    }

    /// Insert an override for a display name (stored under its identity)
    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(slugify(name), value);
    }

    /// Look up the override for an ingredient display name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(&slugify(name)).copied()
    }

    /// Overlay `other` on top of `self`; entries in `other` win
    pub fn merged_with(&self, other: &Overrides) -> Overrides {
        let mut merged = self.clone();
        for (key, value) in &other.0 {
            merged.0.insert(key.clone(), *value);
        }
        merged
    }

    /// Number of overrides
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no overrides
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_entry(entry: &str) -> Option<(String, f64)> {
    let captures = OVERRIDE_ENTRY.captures(entry.trim())?;
    let name = captures.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    let number = captures.get(2)?.as_str().parse::<f64>().ok()?;
    Some((name.to_string(), number))
}

/// Leading number of a metadata value (`"4 people"` → 4)
pub fn meta_number(meta: &Meta, key: &str) -> Option<f64> {
    static LEADING_NUMBER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\s*(\d+(?:[.,]\d+)?)").expect("valid number regex"));

    match meta.get(key)? {
        MetaValue::Number(n) => Some(*n),
        MetaValue::Text(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', ".").parse().ok()),
        MetaValue::List(_) => None,
    }
}

/// Project configuration from `gram.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// CSV ingredient table (relative paths resolve against the config file)
    #[serde(default)]
    pub ingredients: Option<PathBuf>,

    /// Fall back to the built-in ingredient table for names the CSV lacks
    #[serde(default = "default_true")]
    pub extend_builtin: bool,

    /// Global density / unit-weight overrides by ingredient name
    #[serde(default)]
    pub densities: BTreeMap<String, f64>,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Directory the configuration was loaded from
    #[serde(skip)]
    pub base_path: PathBuf,
}

fn default_true() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ingredients: None,
            extend_builtin: true,
            densities: BTreeMap::new(),
            pretty: true,
            base_path: PathBuf::from("."),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a directory or a `gram.yaml` file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = ProjectConfig::load("./recipes")?;
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let mut config: ProjectConfig = serde_yaml::from_str(&contents)?;
        config.base_path = base_path;
        Ok(config)
    }

    /// Load configuration if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(Error::ConfigNotFound { path }) => {
                tracing::debug!("No configuration at {}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Resolved path of the ingredient table, if configured
    pub fn ingredients_path(&self) -> Option<PathBuf> {
        self.ingredients.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.base_path.join(p)
            }
        })
    }

    /// Global overrides from the `densities` map
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides::new();
        for (name, value) in &self.densities {
            overrides.insert(name, *value);
        }
        overrides
    }
}
