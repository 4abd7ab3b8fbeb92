//! Artifact staging.
//!
//! Copies runtime libraries and the license file next to the build output so
//! the module can load them. A file is copied only when the destination is
//! missing or strictly older than the source, so repeated passes over an
//! unchanged tree write nothing. Unrelated files in the output directory are
//! never touched.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::decision::CapabilityDecision;
use crate::reporter::Reporter;

/// What a staging pass does with one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageDecision {
    /// Destination is absent or older than the source.
    Copy,
    /// Destination is at least as new as the source.
    UpToDate,
    /// The source can no longer be read.
    SourceMissing,
}

/// One source/destination pair and what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingAction {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub decision: StageDecision,
}

/// Result of [`execute_staging`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    /// Every action, in plan order.
    pub actions: Vec<StagingAction>,
    /// Files actually written.
    pub copied: usize,
    /// Copies that failed; their previous destination is left in place.
    pub failed: usize,
    /// Destinations present after the pass, for the packaging step.
    pub packaging_inputs: Vec<PathBuf>,
}

/// Plan the staging of every stageable artifact of `decision` into `out_dir`.
pub fn plan_staging(decision: &CapabilityDecision, out_dir: &Path) -> Vec<StagingAction> {
    decision
        .stageable_artifacts()
        .into_iter()
        .map(|(source, file_name)| plan_action(source, out_dir.join(file_name)))
        .collect()
}

/// Compare modification times of `source` and `destination`.
pub fn plan_action(source: &Path, destination: PathBuf) -> StagingAction {
    let decision = match modified(source) {
        None => StageDecision::SourceMissing,
        Some(src) => match modified(&destination) {
            Some(dst) if dst >= src => StageDecision::UpToDate,
            _ => StageDecision::Copy,
        },
    };
    StagingAction {
        source: source.to_path_buf(),
        destination,
        decision,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .ok()
        .filter(std::fs::Metadata::is_file)
        .and_then(|m| m.modified().ok())
}

/// Perform the copies in `actions`.
///
/// Failures are reported as warnings and counted; they never abort the pass
/// and never touch an existing destination.
pub fn execute_staging(actions: Vec<StagingAction>, reporter: &dyn Reporter) -> StagingReport {
    let mut report = StagingReport::default();
    let options = fs_extra::file::CopyOptions::new().overwrite(true);

    for action in &actions {
        reporter.staged(action);
        match action.decision {
            StageDecision::Copy => match copy(&action.source, &action.destination, &options) {
                Ok(()) => report.copied += 1,
                Err(e) => {
                    report.failed += 1;
                    reporter.warning(&format!(
                        "failed to stage {} to {}: {e}",
                        action.source.display(),
                        action.destination.display()
                    ));
                }
            },
            StageDecision::UpToDate => {}
            StageDecision::SourceMissing => reporter.warning(&format!(
                "cannot stage {}: source is missing",
                action.source.display()
            )),
        }
        if action.destination.is_file() {
            report.packaging_inputs.push(action.destination.clone());
        }
    }

    report.actions = actions;
    report
}

/// Copy into a sibling temporary file, then rename it over `destination`, so
/// a failed copy leaves the previous artifact intact and a loaded library is
/// never rewritten in place.
fn copy(
    source: &Path,
    destination: &Path,
    options: &fs_extra::file::CopyOptions,
) -> Result<(), String> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;

    let staging = tempfile::Builder::new()
        .prefix(".optdep-stage")
        .tempfile_in(parent)
        .map_err(|e| e.to_string())?
        .into_temp_path();
    fs_extra::file::copy(source, &staging, options).map_err(|e| e.to_string())?;
    staging.persist(destination).map_err(|e| e.error.to_string())
}

/// Plan and execute staging for `decision` in one call.
pub fn stage(decision: &CapabilityDecision, out_dir: &Path, reporter: &dyn Reporter) -> StagingReport {
    execute_staging(plan_staging(decision, out_dir), reporter)
}
