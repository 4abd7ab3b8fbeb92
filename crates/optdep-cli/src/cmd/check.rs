//! `optdep check`

use anyhow::{Context, Result};
use optdep_core::Manifest;
use std::path::Path;

/// Validate a manifest and print what it declares.
pub fn check(manifest: &Path) -> Result<()> {
    let path = super::manifest_path(manifest);
    let manifest =
        Manifest::load(&path).with_context(|| format!("Invalid manifest {}", path.display()))?;

    println!("Manifest is valid: {}", path.display());
    println!("  Module: {}", manifest.module.name);
    if !manifest.module.description.is_empty() {
        println!("  Description: {}", manifest.module.description);
    }

    let platforms: Vec<&str> = manifest.platform.keys().map(String::as_str).collect();
    if platforms.is_empty() {
        println!("  Platforms: none (always builds a stub)");
    } else {
        println!("  Platforms: {}", platforms.join(", "));
    }

    for (name, requirement) in &manifest.features {
        println!("  Feature: {name} ({requirement:?})");
    }

    match &manifest.build {
        Some(build) if build.auto => println!(
            "  Auto-build: {} {} in {}",
            build.program,
            build.args.join(" "),
            build.working_dir.display()
        ),
        Some(_) => println!("  Auto-build: disabled"),
        None => {}
    }

    Ok(())
}
