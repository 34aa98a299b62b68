//! Compile a recipe document to JSON

use anyhow::{Context, Result};
use std::path::Path;

use super::load_compiler;

/// Run the compile command
pub fn run(config_path: Option<&Path>, file: &Path, output: Option<&Path>, compact: bool) -> Result<()> {
    let (compiler, config) = load_compiler(config_path)?;

    let compilation = compiler
        .compile_file(file)
        .with_context(|| format!("Failed to compile {}", file.display()))?;
    let json = compilation
        .to_json(config.pretty && !compact)
        .context("Failed to serialize compilation")?;

    for warning in &compilation.warnings {
        tracing::warn!("{}: {}", warning.code, warning.message);
    }

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                "✓ {} → {} (hash: {}...)",
                file.display(),
                path.display(),
                &compilation.fingerprint()?[..8]
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
