//! `optdep resolve`

use anyhow::{Context, Result};
use optdep_core::{
    CapabilityDecision, EnvSnapshot, Manifest, ProcessInvoker, StageDecision, StagingReport,
    TracingReporter, build_log_path, try_optdep_home,
};
use optdep_schema::Platform;
use serde::Serialize;
use std::path::Path;

use crate::{OutputFormat, ResolveArgs};

#[derive(Serialize)]
struct Report<'a> {
    decision: &'a CapabilityDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    staging: Option<&'a StagingReport>,
}

/// Resolve one module, optionally stage its artifacts, and print the result.
///
/// Only a bad manifest or an unwritable output file is an error; every
/// resolution problem ends up as a warning in the decision.
pub fn resolve(args: &ResolveArgs) -> Result<()> {
    let path = super::manifest_path(&args.manifest);
    let manifest =
        Manifest::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let path = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let module_dir = path.parent().unwrap_or_else(|| Path::new("."));
    tracing::debug!("Resolving {} from {}", manifest.module.name, path.display());

    let platform = args.platform.unwrap_or_else(Platform::current);
    let env = EnvSnapshot::capture();
    let mut inputs = manifest.inputs(module_dir, platform, &env);
    if args.no_build {
        inputs.disable_auto_build();
    } else if let Some(home) = try_optdep_home(&env) {
        inputs.set_build_log(build_log_path(&home, &manifest.module.name));
    }

    let reporter = TracingReporter;
    let decision = optdep_core::resolve(&inputs, &ProcessInvoker, &reporter);
    let staging = args
        .stage_to
        .as_deref()
        .map(|out| optdep_core::stage(&decision, out, &reporter));

    if let (Some(file), Some(report)) = (&args.packaging_inputs, &staging) {
        let json = serde_json::to_string_pretty(&report.packaging_inputs)?;
        std::fs::write(file, json)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        tracing::debug!("Wrote packaging inputs to {}", file.display());
    }

    match args.format {
        OutputFormat::Text => {
            print!("{}", decision.summary());
            if let Some(report) = &staging {
                let up_to_date = report
                    .actions
                    .iter()
                    .filter(|a| a.decision == StageDecision::UpToDate)
                    .count();
                println!(
                    "  staged:     {} copied, {up_to_date} up to date, {} failed",
                    report.copied, report.failed
                );
            }
        }
        OutputFormat::Json => {
            let report = Report {
                decision: &decision,
                staging: staging.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Defines => {
            for definition in decision.definitions() {
                println!("{definition}");
            }
        }
    }

    Ok(())
}
