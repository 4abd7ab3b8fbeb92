//! Path prober.
//!
//! Tests one candidate directory against one [`ProbeRequirement`]. Only
//! filesystem stats are performed. A missing candidate is an expected outcome,
//! and any I/O error (permission denied, path too long) is folded into
//! [`MissReason::Io`] so that callers never see a failure.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use optdep_schema::{CandidatePath, MissReason, ProbeMatch, ProbeRequirement, ProbeResult};

/// Probe `candidate` for the layout described by `requirement`.
pub fn probe(candidate: &CandidatePath, requirement: &ProbeRequirement) -> ProbeResult {
    match probe_inner(candidate.path(), requirement) {
        Ok(hit) => ProbeResult::Found(ProbeMatch {
            candidate: candidate.clone(),
            subpaths: hit.subpaths,
            marker_dir: hit.marker_dir,
            markers: hit.markers,
            optional_markers: hit.optional_markers,
        }),
        Err(reason) => ProbeResult::NotFound {
            candidate: candidate.clone(),
            reason,
        },
    }
}

struct Hit {
    subpaths: BTreeMap<String, PathBuf>,
    marker_dir: PathBuf,
    markers: Vec<String>,
    optional_markers: Vec<String>,
}

fn probe_inner(root: &Path, requirement: &ProbeRequirement) -> Result<Hit, MissReason> {
    if !is_dir(root).map_err(io_reason)? {
        return Err(MissReason::RootMissing);
    }

    let mut subpaths = BTreeMap::new();
    for required in &requirement.required {
        let resolved = first_existing_dir(root, &required.alternatives)
            .map_err(io_reason)?
            .ok_or_else(|| MissReason::SubpathMissing {
                label: required.label.clone(),
            })?;
        subpaths.insert(required.label.clone(), resolved);
    }

    let marker_dir = first_existing_dir(root, &requirement.marker_dir)
        .map_err(io_reason)?
        .ok_or(MissReason::MarkerDirMissing)?;

    let markers = existing_files(&marker_dir, &requirement.markers).map_err(io_reason)?;
    if markers.is_empty() {
        return Err(MissReason::NoMarker);
    }

    // Optional markers never reject a candidate, not even on I/O errors.
    let optional_markers =
        existing_files(&marker_dir, &requirement.optional_markers).unwrap_or_default();

    Ok(Hit {
        subpaths,
        marker_dir,
        markers,
        optional_markers,
    })
}

/// First alternative under `root` that is an existing directory. No
/// alternatives means the root itself.
fn first_existing_dir(root: &Path, alternatives: &[PathBuf]) -> std::io::Result<Option<PathBuf>> {
    if alternatives.is_empty() {
        return Ok(Some(root.to_path_buf()));
    }
    for alt in alternatives {
        let path = root.join(alt);
        if is_dir(&path)? {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn existing_files(dir: &Path, names: &[String]) -> std::io::Result<Vec<String>> {
    let mut found = Vec::new();
    for name in names {
        if is_file(&dir.join(name))? {
            found.push(name.clone());
        }
    }
    Ok(found)
}

fn is_dir(path: &Path) -> std::io::Result<bool> {
    stat(path).map(|m| m.is_some_and(|m| m.is_dir()))
}

fn is_file(path: &Path) -> std::io::Result<bool> {
    stat(path).map(|m| m.is_some_and(|m| m.is_file()))
}

/// `metadata`, with "does not exist" mapped to `None`.
fn stat(path: &Path) -> std::io::Result<Option<std::fs::Metadata>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(None),
        Err(e) => Err(e),
    }
}

fn io_reason(err: std::io::Error) -> MissReason {
    MissReason::Io {
        message: err.to_string(),
    }
}
