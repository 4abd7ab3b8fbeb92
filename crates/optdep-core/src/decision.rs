//! The immutable capability record produced by one resolution pass.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use optdep_schema::{BuildAttemptOutcome, BuildMode, FeatureRequirement, Platform, Provenance, Tier};
use serde::Serialize;

/// Compile and link inputs of a located SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkPaths {
    /// Root of the installation that satisfied the probe.
    pub root: PathBuf,
    /// Tier the root was found in.
    pub tier: Tier,
    /// Where the root came from (`bundled`, `$RIVERMAX_SDK_PATH`, ...).
    pub origin: String,
    /// Header search directories.
    pub include_dirs: Vec<PathBuf>,
    /// Library search directories.
    pub library_dirs: Vec<PathBuf>,
    /// Declared link libraries that exist in a library directory.
    pub link_libraries: Vec<PathBuf>,
    /// Optional API-level markers found next to the headers.
    pub api_markers: Vec<String>,
}

/// A runtime shared library the module needs at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeArtifact {
    /// Located file.
    pub source: PathBuf,
    /// File name it is staged under.
    pub file_name: String,
    /// Whether it may be staged.
    pub provenance: Provenance,
}

/// Outcome of resolving one module for one platform.
///
/// Built once by [`resolve`](crate::resolve) and never mutated. Two passes
/// over an unchanged filesystem and environment compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDecision {
    pub(crate) module: String,
    pub(crate) platform: Platform,
    pub(crate) mode: BuildMode,
    pub(crate) features: BTreeMap<String, bool>,
    pub(crate) sdk: Option<SdkPaths>,
    pub(crate) runtime: Vec<RuntimeArtifact>,
    pub(crate) credential: Option<PathBuf>,
    pub(crate) delay_load: Vec<String>,
    pub(crate) system_libraries: Vec<String>,
    pub(crate) frameworks: Vec<String>,
    pub(crate) platform_definitions: Vec<String>,
    pub(crate) build: Option<BuildAttemptOutcome>,
    pub(crate) warnings: Vec<String>,
}

impl CapabilityDecision {
    /// Name of the resolved module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Platform the decision was made for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// How the module is built.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Availability of every declared feature, by name.
    pub fn features(&self) -> &BTreeMap<String, bool> {
        &self.features
    }

    /// Availability of one feature; undeclared features are unavailable.
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// SDK paths, present unless the mode is [`BuildMode::Stub`].
    pub fn sdk(&self) -> Option<&SdkPaths> {
        self.sdk.as_ref()
    }

    /// Runtime libraries that were found, with their provenance.
    pub fn runtime(&self) -> &[RuntimeArtifact] {
        &self.runtime
    }

    /// License file, when one was found.
    pub fn credential(&self) -> Option<&Path> {
        self.credential.as_deref()
    }

    /// Runtime libraries whose load is deferred until first use.
    pub fn delay_load(&self) -> &[String] {
        &self.delay_load
    }

    /// System libraries to link, empty for a stub build.
    pub fn system_libraries(&self) -> &[String] {
        &self.system_libraries
    }

    /// Frameworks to link, empty for a stub build.
    pub fn frameworks(&self) -> &[String] {
        &self.frameworks
    }

    /// Outcome of the auto-build, when one was attempted.
    pub fn build(&self) -> Option<&BuildAttemptOutcome> {
        self.build.as_ref()
    }

    /// Every warning raised during resolution, in order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Preprocessor definitions: one `NAME=1` or `NAME=0` per feature, then
    /// the platform's own definitions.
    pub fn definitions(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|(name, on)| format!("{name}={}", u8::from(*on)))
            .chain(self.platform_definitions.iter().cloned())
            .collect()
    }

    /// Files the stager may copy into the output directory: installable
    /// runtime libraries, plus the credential when the SDK is compiled in.
    pub fn stageable_artifacts(&self) -> Vec<(&Path, &str)> {
        let mut artifacts: Vec<(&Path, &str)> = self
            .runtime
            .iter()
            .filter(|a| a.provenance.is_copyable())
            .map(|a| (a.source.as_path(), a.file_name.as_str()))
            .collect();
        if self.mode.has_sdk() {
            if let Some(credential) = &self.credential {
                if let Some(name) = credential.file_name().and_then(|n| n.to_str()) {
                    artifacts.push((credential.as_path(), name));
                }
            }
        }
        artifacts
    }

    /// Multi-line human readable report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({}): {}", self.module, self.platform, self.mode);

        match &self.sdk {
            Some(sdk) => {
                let _ = writeln!(out, "  sdk:        {} ({})", sdk.root.display(), sdk.origin);
                for lib in &sdk.link_libraries {
                    let _ = writeln!(out, "  link:       {}", lib.display());
                }
                if !sdk.api_markers.is_empty() {
                    let _ = writeln!(out, "  api:        {}", sdk.api_markers.join(", "));
                }
            }
            None => {
                let _ = writeln!(out, "  sdk:        not found");
            }
        }

        if self.runtime.is_empty() {
            let _ = writeln!(out, "  runtime:    none");
        }
        for artifact in &self.runtime {
            let note = match artifact.provenance {
                Provenance::Installable => "",
                Provenance::SearchPathOnly => " [search path, not staged]",
            };
            let _ = writeln!(out, "  runtime:    {}{note}", artifact.source.display());
        }

        match &self.credential {
            Some(path) => {
                let _ = writeln!(out, "  credential: {}", path.display());
            }
            None => {
                let _ = writeln!(out, "  credential: not found");
            }
        }
        if let Some(build) = &self.build {
            let _ = writeln!(out, "  build:      {build}");
        }
        if !self.delay_load.is_empty() {
            let _ = writeln!(out, "  delay-load: {}", self.delay_load.join(", "));
        }
        for definition in self.definitions() {
            let _ = writeln!(out, "  define:     {definition}");
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "  warning:    {warning}");
        }
        out
    }
}

/// Whether a feature with `requirement` is available.
pub fn feature_available(requirement: FeatureRequirement, mode: BuildMode, credential: bool) -> bool {
    match requirement {
        FeatureRequirement::Always => true,
        FeatureRequirement::Sdk => mode.has_sdk(),
        FeatureRequirement::Runtime => mode == BuildMode::Full,
        FeatureRequirement::Credential => mode.has_sdk() && credential,
        FeatureRequirement::Full => mode == BuildMode::Full && credential,
    }
}
