//! `optdep new`

use anyhow::{Context, Result};
use optdep_core::{MANIFEST_FILE, Manifest};
use std::path::Path;

/// Create a manifest template for module `name` in `output_dir`.
pub fn new(name: &str, output_dir: &Path) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Module name must not be empty");
    }

    let path = output_dir.join(MANIFEST_FILE);
    if path.exists() {
        anyhow::bail!("Manifest already exists: {}", path.display());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    std::fs::write(&path, Manifest::template(name))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created manifest template: {}", path.display());
    println!(
        "Edit it and run 'optdep check {}' to validate.",
        path.display()
    );

    Ok(())
}
