//! Candidate locations, artifact classes, build outcomes and modes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Priority bucket of a candidate location.
///
/// Declaration order is priority order: a bundled copy always beats an
/// environment override, which always beats a system-wide install. This keeps
/// a self-contained distribution reproducible regardless of host state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Shipped alongside the module (e.g. `ThirdParty/Rivermax`).
    Bundled,
    /// Named by an environment variable (e.g. `RIVERMAX_SDK_PATH`).
    Environment,
    /// Conventional install location or the loader search path.
    System,
}

impl Tier {
    /// Lowercase name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::Environment => "environment",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location to probe, with the tier it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePath {
    /// Directory to probe.
    pub root: PathBuf,
    /// Priority bucket.
    pub tier: Tier,
    /// Where the path came from (`bundled`, `$RIVERMAX_SDK_PATH`, `system`, ...).
    pub origin: String,
}

impl CandidatePath {
    /// A directory shipped with the module.
    pub fn bundled(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tier: Tier::Bundled,
            origin: "bundled".to_string(),
        }
    }

    /// A directory named by environment variable `var`.
    pub fn environment(var: &str, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tier: Tier::Environment,
            origin: format!("${var}"),
        }
    }

    /// A conventional system install location.
    pub fn system(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tier: Tier::System,
            origin: "system".to_string(),
        }
    }

    /// An entry of the dynamic loader's search path.
    pub fn search_path(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tier: Tier::System,
            origin: "search path".to_string(),
        }
    }

    /// The probed directory.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.root.display(), self.origin)
    }
}

/// The three independently located kinds of artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactClass {
    /// Headers and link libraries.
    Sdk,
    /// Shared libraries needed at execution time.
    Runtime,
    /// License file.
    Credential,
}

impl ArtifactClass {
    /// Lowercase name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::Runtime => "runtime",
            Self::Credential => "credential",
        }
    }
}

impl std::fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an artifact was found, which decides whether it may be packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Found under a candidate root; may be copied into the build output.
    Installable,
    /// Found only on the loader search path; usable at runtime, never staged.
    SearchPathOnly,
}

impl Provenance {
    /// Whether the artifact may be staged into the output directory.
    pub fn is_copyable(&self) -> bool {
        matches!(self, Self::Installable)
    }
}

/// Result of one external toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildAttemptOutcome {
    /// The build exited with status zero.
    Succeeded,
    /// The build exited nonzero, was killed by a signal (`code: None`) or
    /// could not be spawned.
    Failed {
        /// Exit code, when the process produced one.
        code: Option<i32>,
    },
    /// The build exceeded its wall-clock budget and was killed.
    TimedOut {
        /// The budget that was exceeded, in seconds.
        after_secs: u64,
    },
    /// No toolchain executable could be found; nothing was spawned.
    ToolchainUnavailable,
}

impl BuildAttemptOutcome {
    /// Whether the build completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for BuildAttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { code: Some(code) } => write!(f, "failed with exit code {code}"),
            Self::Failed { code: None } => write!(f, "failed without an exit code"),
            Self::TimedOut { after_secs } => write!(f, "timed out after {after_secs}s"),
            Self::ToolchainUnavailable => write!(f, "toolchain unavailable"),
        }
    }
}

/// Terminal build mode chosen for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// SDK and runtime binaries present: compile and link normally.
    Full,
    /// SDK present, runtime binaries absent: compile against the SDK but defer
    /// loading so the module still loads with the feature disabled.
    GracefulDegraded,
    /// SDK absent: the optional feature is compiled out.
    Stub,
}

impl BuildMode {
    /// Whether the SDK interface is compiled in.
    pub fn has_sdk(&self) -> bool {
        !matches!(self, Self::Stub)
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::GracefulDegraded => write!(f, "graceful-degraded"),
            Self::Stub => write!(f, "stub"),
        }
    }
}

/// Rule mapping a named feature to availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureRequirement {
    /// Always available (e.g. a pure-HTTP protocol layer).
    Always,
    /// Available whenever the SDK interface is compiled in.
    Sdk,
    /// Available only with runtime binaries present (`Full`).
    Runtime,
    /// Available when both the SDK and the credential are present.
    Credential,
    /// Available only in `Full` mode with the credential present.
    Full,
}

/// What to do when the SDK is present but runtime binaries are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialPolicy {
    /// Compile against the SDK and defer loading (`GracefulDegraded`).
    #[default]
    Degrade,
    /// Refuse to compile the feature in (`Stub`).
    Stub,
}
