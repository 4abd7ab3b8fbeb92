//! Artifact locator.
//!
//! Candidates are probed in tier order and the first match wins. Candidates
//! within one tier keep their declared order, so the order an author lists
//! system paths in is still honoured.

use std::path::PathBuf;

use optdep_schema::{
    ArtifactClass, ArtifactVerdict, CandidatePath, ProbeRequirement, ProbeResult, Provenance,
};

use crate::probe::probe;
use crate::reporter::Reporter;

/// Locate `class` among `candidates`.
///
/// Every probe is reported. Probing stops at the first success.
pub fn locate(
    class: ArtifactClass,
    candidates: &[CandidatePath],
    requirement: &ProbeRequirement,
    reporter: &dyn Reporter,
) -> ArtifactVerdict {
    let verdict = first_match(class, candidates, requirement, Provenance::Installable, reporter)
        .unwrap_or(ArtifactVerdict::Absent { class });
    reporter.located(&verdict);
    verdict
}

/// Locate runtime binaries: candidate roots first, then every entry of the
/// loader search path.
///
/// A search-path entry is probed with the same markers directly under the
/// entry, and a hit there is [`Provenance::SearchPathOnly`].
pub fn locate_runtime(
    candidates: &[CandidatePath],
    requirement: &ProbeRequirement,
    search_path: &[PathBuf],
    reporter: &dyn Reporter,
) -> ArtifactVerdict {
    let class = ArtifactClass::Runtime;
    let verdict = first_match(class, candidates, requirement, Provenance::Installable, reporter)
        .or_else(|| {
            let entries: Vec<CandidatePath> = search_path
                .iter()
                .map(|entry| CandidatePath::search_path(entry.clone()))
                .collect();
            let flat = ProbeRequirement::with_markers(requirement.markers.iter().cloned());
            first_match(class, &entries, &flat, Provenance::SearchPathOnly, reporter)
        })
        .unwrap_or(ArtifactVerdict::Absent { class });
    reporter.located(&verdict);
    verdict
}

/// Candidates in probe order: stable by tier.
pub fn ordered(candidates: &[CandidatePath]) -> Vec<&CandidatePath> {
    let mut ordered: Vec<&CandidatePath> = candidates.iter().collect();
    ordered.sort_by_key(|c| c.tier);
    ordered
}

fn first_match(
    class: ArtifactClass,
    candidates: &[CandidatePath],
    requirement: &ProbeRequirement,
    provenance: Provenance,
    reporter: &dyn Reporter,
) -> Option<ArtifactVerdict> {
    if !requirement.has_markers() {
        return None;
    }
    ordered(candidates).into_iter().find_map(|candidate| {
        let result = probe(candidate, requirement);
        reporter.probed(class, &result);
        match result {
            ProbeResult::Found(hit) => Some(ArtifactVerdict::Present {
                class,
                hit,
                provenance,
            }),
            ProbeResult::NotFound { .. } => None,
        }
    })
}
