//! Compile a recipe and report its diagnostics

use anyhow::{Context, Result};
use std::path::Path;

use super::load_compiler;

/// Run the check command
pub fn run(config_path: Option<&Path>, file: &Path, strict: bool) -> Result<()> {
    let (compiler, _) = load_compiler(config_path)?;

    let compilation = compiler
        .compile_file(file)
        .with_context(|| format!("Failed to compile {}", file.display()))?;

    for warning in &compilation.warnings {
        let location = warning
            .item
            .as_deref()
            .or(warning.section.as_deref())
            .unwrap_or("-");
        println!("{} [{}] {}", warning.code, location, warning.message);
    }

    let metrics = &compilation.metrics;
    tracing::info!(
        "{}: {} min total, {} min active, {} g ({:?})",
        compilation.title.as_deref().unwrap_or("untitled"),
        metrics.total_time,
        metrics.active_time,
        metrics.mass.total_mass,
        metrics.mass.mass_status
    );

    if compilation.warnings.is_empty() {
        println!("✓ {} is clean", file.display());
    } else if strict {
        anyhow::bail!(
            "{} warning(s) in {}",
            compilation.warnings.len(),
            file.display()
        );
    }

    Ok(())
}
