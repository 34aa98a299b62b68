//! Print the consolidated shopping list

use anyhow::{Context, Result};
use gram_compiler::ShoppingItem;
use gram_compiler::model::{Usage, format_number};
use std::path::Path;

use super::load_compiler;

/// Run the shopping command
pub fn run(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let (compiler, _) = load_compiler(config_path)?;

    let compilation = compiler
        .compile_file(file)
        .with_context(|| format!("Failed to compile {}", file.display()))?;

    for item in &compilation.shopping_list {
        println!("- {}", describe(item));
    }
    Ok(())
}

fn describe(item: &ShoppingItem) -> String {
    match item {
        ShoppingItem::Ingredient(entry) => {
            let mut parts: Vec<String> = Vec::new();
            if let Some(qty) = entry.qty {
                parts.push(quantity(qty, entry.unit.as_deref()));
            }
            parts.extend(entry.variable_entries.iter().cloned());

            if parts.is_empty() {
                entry.name.clone()
            } else {
                format!("{}: {}", entry.name, parts.join(" + "))
            }
        }
        ShoppingItem::Composite(entry) => {
            let usage: Vec<String> = entry
                .usage
                .iter()
                .map(|part| format!("{} {}", part.name, quantity(part.qty, part.unit.as_deref())))
                .collect();
            format!("{}: {} ({})", entry.name, format_number(entry.qty), usage.join(", "))
        }
        ShoppingItem::Alternative(group) => group
            .options
            .iter()
            .filter_map(|option| match option {
                Usage::Ingredient(item) | Usage::Cookware(item) => Some(item.name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

fn quantity(qty: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{} {}", format_number(qty), unit),
        None => format_number(qty),
    }
}
