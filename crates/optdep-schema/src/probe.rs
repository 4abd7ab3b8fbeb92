//! Probe requirements, probe results and artifact verdicts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{ArtifactClass, CandidatePath, Provenance, Tier};

/// A labelled directory that must exist under a candidate root.
///
/// Alternatives are tried in order and the first existing directory wins,
/// so `lib/x64` can be preferred over `lib` when both layouts are in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredSubpath {
    /// Name the resolved path is recorded under (`include`, `lib`, ...).
    pub label: String,
    /// Relative paths to try, most specific first.
    pub alternatives: Vec<PathBuf>,
}

impl RequiredSubpath {
    /// Create a requirement named `label` satisfied by any of `alternatives`.
    pub fn new<I, P>(label: impl Into<String>, alternatives: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            label: label.into(),
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }
}

/// Structural signature proving an artifact class is present at a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProbeRequirement {
    /// Directories that must all exist.
    pub required: Vec<RequiredSubpath>,
    /// Where markers are looked up (first existing alternative). Empty means
    /// the candidate root itself.
    pub marker_dir: Vec<PathBuf>,
    /// At least one of these files must exist in the marker directory.
    pub markers: Vec<String>,
    /// Recorded when present; never required.
    pub optional_markers: Vec<String>,
}

impl ProbeRequirement {
    /// A requirement satisfied by any of `markers` directly under the root.
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add a required subpath.
    pub fn require(mut self, subpath: RequiredSubpath) -> Self {
        self.required.push(subpath);
        self
    }

    /// Look markers up in the first existing of `alternatives`.
    pub fn markers_in<I, P>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.marker_dir = alternatives.into_iter().map(Into::into).collect();
        self
    }

    /// Record these markers when present.
    pub fn optional<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// A requirement without markers can never be satisfied; callers use this
    /// to treat an artifact class as not applicable.
    pub fn has_markers(&self) -> bool {
        !self.markers.is_empty()
    }
}

/// A successful probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeMatch {
    /// The candidate that satisfied the requirement.
    pub candidate: CandidatePath,
    /// Resolved required subpaths, keyed by label.
    pub subpaths: BTreeMap<String, PathBuf>,
    /// Resolved marker directory.
    pub marker_dir: PathBuf,
    /// Markers that exist, in requirement order.
    pub markers: Vec<String>,
    /// Optional markers that exist, in requirement order.
    pub optional_markers: Vec<String>,
}

impl ProbeMatch {
    /// Resolved directory for a required subpath label.
    pub fn subpath(&self, label: &str) -> Option<&Path> {
        self.subpaths.get(label).map(PathBuf::as_path)
    }

    /// Absolute paths of every matched marker.
    pub fn marker_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.markers.iter().map(|m| self.marker_dir.join(m))
    }

    /// Whether optional marker `name` was found.
    pub fn has_optional(&self, name: &str) -> bool {
        self.optional_markers.iter().any(|m| m == name)
    }
}

/// Why a candidate did not satisfy a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissReason {
    /// The candidate root does not exist or is not a directory.
    RootMissing,
    /// No alternative of a required subpath exists.
    SubpathMissing {
        /// Label of the unsatisfied subpath.
        label: String,
    },
    /// No alternative of the marker directory exists.
    MarkerDirMissing,
    /// The marker directory exists but holds none of the markers.
    NoMarker,
    /// A filesystem error occurred; treated exactly like absence.
    Io {
        /// The error message.
        message: String,
    },
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootMissing => write!(f, "directory does not exist"),
            Self::SubpathMissing { label } => write!(f, "missing '{label}' directory"),
            Self::MarkerDirMissing => write!(f, "marker directory does not exist"),
            Self::NoMarker => write!(f, "no marker file found"),
            Self::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

/// Outcome of testing one candidate against one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeResult {
    /// The candidate satisfies the requirement.
    Found(ProbeMatch),
    /// The candidate does not satisfy the requirement.
    NotFound {
        /// The probed candidate.
        candidate: CandidatePath,
        /// Why it was rejected.
        reason: MissReason,
    },
}

impl ProbeResult {
    /// The probed candidate.
    pub fn candidate(&self) -> &CandidatePath {
        match self {
            Self::Found(hit) => &hit.candidate,
            Self::NotFound { candidate, .. } => candidate,
        }
    }

    /// Whether the candidate satisfied the requirement.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The match, if any.
    pub fn into_match(self) -> Option<ProbeMatch> {
        match self {
            Self::Found(hit) => Some(hit),
            Self::NotFound { .. } => None,
        }
    }
}

/// First successful probe for an artifact class, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ArtifactVerdict {
    /// A candidate satisfied the requirement.
    Present {
        /// Artifact class that was located.
        class: ArtifactClass,
        /// The winning probe.
        hit: ProbeMatch,
        /// Whether the artifact may be staged.
        provenance: Provenance,
    },
    /// No candidate satisfied the requirement.
    Absent {
        /// Artifact class that was searched for.
        class: ArtifactClass,
    },
}

impl ArtifactVerdict {
    /// The artifact class this verdict is for.
    pub fn class(&self) -> ArtifactClass {
        match self {
            Self::Present { class, .. } | Self::Absent { class } => *class,
        }
    }

    /// Whether the artifact was found.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// The winning probe, if any.
    pub fn hit(&self) -> Option<&ProbeMatch> {
        match self {
            Self::Present { hit, .. } => Some(hit),
            Self::Absent { .. } => None,
        }
    }

    /// Provenance of the winning probe, if any.
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            Self::Present { provenance, .. } => Some(*provenance),
            Self::Absent { .. } => None,
        }
    }

    /// Tier of the winning candidate, if any.
    pub fn tier(&self) -> Option<Tier> {
        self.hit().map(|hit| hit.candidate.tier)
    }
}
