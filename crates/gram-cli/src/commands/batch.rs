//! Compile every recipe document under a directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::load_compiler;

/// Run the batch command
pub fn run(config_path: Option<&Path>, dir: &Path, output: Option<&Path>) -> Result<()> {
    let (compiler, config) = load_compiler(config_path)?;
    let out_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join("compiled"));

    let documents = find_documents(dir, &out_dir);
    if documents.is_empty() {
        anyhow::bail!("No recipe documents found in {}", dir.display());
    }

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    tracing::info!("Compiling {} documents from {}", documents.len(), dir.display());

    let mut failed = Vec::new();
    for path in &documents {
        let compilation = match compiler.compile_file(path) {
            Ok(compilation) => compilation,
            Err(e) => {
                tracing::error!("✗ {}: {}", path.display(), e);
                failed.push(path.display().to_string());
                continue;
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recipe".to_string());
        let target = out_dir.join(format!("{}.json", stem));
        let json = compilation.to_json(config.pretty)?;
        std::fs::write(&target, json + "\n")
            .with_context(|| format!("Failed to write {}", target.display()))?;

        tracing::info!(
            "  ✓ {} ({} warnings, hash: {}...)",
            stem,
            compilation.warnings.len(),
            &compilation.fingerprint()?[..8]
        );
    }

    if !failed.is_empty() {
        anyhow::bail!("{} document(s) failed: {}", failed.len(), failed.join(", "));
    }

    println!("Compiled {} documents into {}", documents.len(), out_dir.display());
    Ok(())
}

/// `.json`, `.yaml` and `.yml` files in walk order, skipping the output directory
fn find_documents(dir: &Path, out_dir: &Path) -> Vec<PathBuf> {
    let mut documents: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.path() != out_dir)
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "json" || ext == "yaml" || ext == "yml")
        })
        .filter(|e| e.file_name().to_str() != Some(gram_core::config::CONFIG_FILE))
        .map(|e| e.into_path())
        .collect();
    documents.sort();
    documents
}
