//! CLI command implementations

pub mod batch;
pub mod check;
pub mod compile;
pub mod shopping;

use anyhow::{Context, Result};
use gram_compiler::{CompileOptions, Compiler};
use gram_core::ProjectConfig;
use std::path::Path;

/// Load the project configuration and build a compiler from it.
///
/// An explicitly given configuration must exist; otherwise `./gram.yaml` is
/// used when present.
pub fn load_compiler(config_path: Option<&Path>) -> Result<(Compiler, ProjectConfig)> {
    let config = match config_path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            ProjectConfig::load(path).context("Failed to load configuration")?
        }
        None => ProjectConfig::load_or_default(".").context("Failed to load configuration")?,
    };

    let options = CompileOptions::from_config(&config).context("Failed to load ingredient table")?;
    Ok((Compiler::new(options), config))
}
