//! Recipe compiler
//!
//! Runs the passes in order over one document tree and assembles the
//! [`Compilation`].

use std::path::Path;
use std::sync::Arc;

use gram_core::{Overrides, ProjectConfig, Recipe, slugify};

use crate::error::{Error, Result};
use crate::ingredients::{BuiltinIngredients, IngredientSource, IngredientTable};
use crate::mass::Normalizer;
use crate::metrics::{counted_usages, mass_metrics, nutrition, preparation_time};
use crate::model::{Compilation, Metrics, Modifier, Usage};
use crate::sections::compile_sections;
use crate::shopping::generate_shopping_list;

/// Options for the compiler
#[derive(Clone)]
pub struct CompileOptions {
    /// Project-wide density / unit-weight overrides; recipe metadata wins
    pub overrides: Overrides,

    /// Ingredient property lookup
    pub ingredients: Arc<dyn IngredientSource + Send + Sync>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            overrides: Overrides::new(),
            ingredients: Arc::new(BuiltinIngredients),
        }
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl CompileOptions {
    /// Options from a project configuration.
    ///
    /// Loads the configured ingredient table, falling back to the built-in
    /// one for unknown names when `extend_builtin` is set.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        let ingredients: Arc<dyn IngredientSource + Send + Sync> = match config.ingredients_path() {
            Some(path) => {
                let table = IngredientTable::load(&path)?;
                tracing::debug!("Loaded {} ingredients from {}", table.len(), path.display());
                if config.extend_builtin {
                    Arc::new(table.with_builtin_fallback())
                } else {
                    Arc::new(table)
                }
            }
            None => Arc::new(BuiltinIngredients),
        };

        Ok(Self {
            overrides: config.overrides(),
            ingredients,
        })
    }
}

/// Recipe compiler
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with the given options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile a document tree.
    ///
    /// Fails only when the root is not a `Recipe`; everything else becomes a
    /// warning on the result.
    pub fn compile(&self, recipe: &Recipe) -> Result<Compilation> {
        if !recipe.is_recipe() {
            return Err(Error::InvalidRoot {
                found: recipe.node_type.clone(),
            });
        }

        let overrides = self
            .options
            .overrides
            .merged_with(&Overrides::from_meta(&recipe.meta));
        let source = self.options.ingredients.as_ref();
        let normalizer = Normalizer::new(&overrides, source);

        let compiled = compile_sections(&recipe.children, normalizer);
        let registry = compiled.registry;
        let mut sections = compiled.sections;

        for section in &mut sections {
            section.metrics = Some(mass_metrics(&section.ingredients));
        }

        let shopping_list = generate_shopping_list(&mut sections, &registry, &normalizer);

        let cookware: Vec<Usage> = sections
            .iter()
            .flat_map(|section| &section.cookware)
            .filter(|usage| match usage {
                Usage::Cookware(item) => !item.has_modifier(&Modifier::Reference),
                _ => true,
            })
            .cloned()
            .collect();

        let metrics = Metrics {
            total_time: compiled.schedule.total_time(),
            active_time: compiled.schedule.active_time,
            preparation_time: preparation_time(&registry, &sections),
            mass: mass_metrics(counted_usages(&sections)),
            nutrition: nutrition(counted_usages(&sections), source, &recipe.meta),
        };

        let title = recipe.title().map(str::to_string);
        tracing::info!(
            "Compiled '{}': {} sections, {} ingredients, {} warnings",
            title.as_deref().unwrap_or("untitled"),
            sections.len(),
            registry.ingredients.len(),
            compiled.warnings.len()
        );

        Ok(Compilation {
            slug: title.as_deref().map(slugify),
            title,
            meta: recipe.meta.clone(),
            registry,
            shopping_list,
            cookware,
            sections,
            warnings: compiled.warnings,
            metrics,
        })
    }

    /// Load and compile a `.json`, `.yaml` or `.yml` document
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Compilation> {
        let path = path.as_ref();
        tracing::debug!("Compiling recipe: {}", path.display());
        let recipe = Recipe::load(path)?;
        self.compile(&recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MassStatus;
    use serde_json::json;

    fn recipe(value: serde_json::Value) -> Recipe {
        Recipe::from_value(value).unwrap()
    }

    #[test]
    fn test_rejects_non_recipe_root() {
        let err = Compiler::default()
            .compile(&recipe(json!({"type": "Section", "children": []})))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoot { ref found } if found == "Section"));
    }

    #[test]
    fn test_meta_overrides_beat_config() {
        let mut options = CompileOptions::default();
        options.overrides.insert("honey", 2.0);
        let compiler = Compiler::new(options);

        let compile = |meta: serde_json::Value| {
            compiler
                .compile(&recipe(json!({
                    "type": "Recipe",
                    "meta": meta,
                    "children": [{"type": "Step", "children": [
                        {"type": "Ingredient", "name": "honey", "modifiers": [],
                         "quantity": {"type": "Quantity", "value": {"type": "single", "value": 10}, "unit": "ml"}}
                    ]}]
                })))
                .unwrap()
        };

        assert_eq!(compile(json!({})).metrics.mass.total_mass, 20.0);
        assert_eq!(
            compile(json!({"densities": "honey: 1.5"})).metrics.mass.total_mass,
            15.0
        );
    }

    #[test]
    fn test_title_and_slug() {
        let compilation = Compiler::default()
            .compile(&recipe(json!({
                "type": "Recipe",
                "meta": {"title": "Crème Brûlée"},
                "children": []
            })))
            .unwrap();
        assert_eq!(compilation.title.as_deref(), Some("Crème Brûlée"));
        assert_eq!(compilation.slug.as_deref(), Some("creme-brulee"));
        assert_eq!(compilation.metrics.mass.mass_status, MassStatus::Precise);
        assert!(compilation.metrics.nutrition.is_none());
    }

    #[test]
    fn test_reference_cookware_left_out_of_global_list() {
        let compilation = Compiler::default()
            .compile(&recipe(json!({
                "type": "Recipe",
                "children": [{"type": "Step", "children": [
                    {"type": "Cookware", "name": "bowl", "modifiers": []},
                    {"type": "Cookware", "name": "bowl", "modifiers": ["&"]}
                ]}]
            })))
            .unwrap();
        assert_eq!(compilation.sections[0].cookware.len(), 2);
        assert_eq!(compilation.cookware.len(), 1);
    }
}
