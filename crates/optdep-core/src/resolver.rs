//! Capability resolution.
//!
//! Combines the SDK, runtime and credential verdicts, plus at most one
//! auto-build, into a [`CapabilityDecision`]. Resolution never fails: every
//! problem narrows the compiled feature set and is recorded as a warning.
//!
//! ```text
//! Unprobed -> SdkPresent | SdkAbsent
//! SdkAbsent -> Building -> SdkPresent | SdkAbsent     (once, when enabled)
//! SdkPresent -> Full | GracefulDegraded | Stub        (runtime + policy)
//! SdkAbsent -> Stub
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use optdep_schema::{
    ArtifactClass, ArtifactVerdict, BuildAttemptOutcome, BuildMode, CandidatePath,
    FeatureRequirement, PartialPolicy, Platform, ProbeMatch, ProbeRequirement,
};

use crate::decision::{CapabilityDecision, RuntimeArtifact, SdkPaths, feature_available};
use crate::invoker::{BuildInvoker, BuildRequest};
use crate::locate::{locate, locate_runtime};
use crate::reporter::Reporter;

/// Required-subpath label whose resolved directory holds the headers.
pub const INCLUDE: &str = "include";

/// Required-subpath label whose resolved directory holds link libraries.
pub const LIB: &str = "lib";

/// Everything one resolution pass needs for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInputs {
    /// Module name, used in messages.
    pub module: String,
    /// Target platform.
    pub platform: Platform,
    /// Platform-specific inputs; `None` when the module does not support
    /// `platform`.
    pub target: Option<PlatformInputs>,
    /// Declared features and the rule each one follows.
    pub features: BTreeMap<String, FeatureRequirement>,
    /// What to do when the SDK is present without usable runtime binaries.
    pub policy: PartialPolicy,
}

impl ResolveInputs {
    /// Never attempt an auto-build.
    pub fn disable_auto_build(&mut self) {
        if let Some(target) = self.target.as_mut() {
            target.auto_build = None;
        }
    }

    /// Tee auto-build output into `path`.
    pub fn set_build_log(&mut self, path: impl Into<PathBuf>) {
        if let Some(request) = self.target.as_mut().and_then(|t| t.auto_build.as_mut()) {
            request.log_path = Some(path.into());
        }
    }
}

/// Candidate lists, requirements and library sets for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlatformInputs {
    pub sdk_candidates: Vec<CandidatePath>,
    pub sdk: ProbeRequirement,
    pub runtime_candidates: Vec<CandidatePath>,
    /// Runtime libraries as markers; no markers means none are required.
    pub runtime: ProbeRequirement,
    /// Loader search path entries scanned after `runtime_candidates`.
    pub search_path: Vec<PathBuf>,
    pub credential_candidates: Vec<CandidatePath>,
    /// License file names as markers; no markers disables the lookup.
    pub credential: ProbeRequirement,
    /// Also look for the credential in the resolved SDK root.
    pub credential_in_sdk_root: bool,
    /// Link library file names, looked up in the SDK library directories.
    pub link_libraries: Vec<String>,
    pub system_libraries: Vec<String>,
    pub frameworks: Vec<String>,
    /// Platform definitions, emitted in every mode.
    pub definitions: Vec<String>,
    /// Defer loading of runtime libraries whenever the SDK is compiled in.
    pub delay_load: bool,
    /// Build to run once when the SDK is absent.
    pub auto_build: Option<BuildRequest>,
}

enum Phase<'a> {
    Unprobed,
    SdkAbsent,
    Building(&'a BuildRequest),
    SdkPresent(ProbeMatch),
}

/// Resolve `inputs` into a decision.
///
/// The invoker is called at most once, and only when `auto_build` is set, the
/// SDK is absent and the build's working directory exists.
pub fn resolve(
    inputs: &ResolveInputs,
    invoker: &dyn BuildInvoker,
    reporter: &dyn Reporter,
) -> CapabilityDecision {
    let mut warnings = Warnings::new(reporter);

    let Some(target) = &inputs.target else {
        warnings.push(format!(
            "platform {} is not supported by {}; building without the optional dependency",
            inputs.platform, inputs.module
        ));
        return finish(inputs, BuildMode::Stub, Parts::default(), warnings.into_inner(), reporter);
    };

    let mut build = None;
    let mut phase = Phase::Unprobed;
    let sdk_hit = loop {
        phase = match phase {
            Phase::Unprobed => locate_sdk(target, reporter),
            Phase::SdkAbsent => match build_gate(target, build.is_some(), &mut warnings) {
                Some(request) => Phase::Building(request),
                None => break None,
            },
            Phase::Building(request) => {
                let outcome = invoker.invoke(request, reporter);
                if !outcome.is_success() {
                    warnings.push(build_remediation(request, &outcome));
                }
                build = Some(outcome);
                locate_sdk(target, reporter)
            }
            Phase::SdkPresent(hit) => break Some(hit),
        };
    };

    let credential = locate_credential(target, sdk_hit.as_ref(), reporter);

    let Some(sdk_hit) = sdk_hit else {
        warnings.push(sdk_remediation(target));
        let parts = Parts {
            credential,
            build,
            ..Parts::default()
        };
        return finish(inputs, BuildMode::Stub, parts, warnings.into_inner(), reporter);
    };

    let runtime_required = target.runtime.has_markers();
    let runtime = if runtime_required {
        locate_runtime(
            &target.runtime_candidates,
            &target.runtime,
            &target.search_path,
            reporter,
        )
    } else {
        ArtifactVerdict::Absent {
            class: ArtifactClass::Runtime,
        }
    };

    let co_located = runtime
        .hit()
        .is_some_and(|hit| hit.candidate.root == sdk_hit.candidate.root);
    let mode = if !runtime_required || co_located {
        BuildMode::Full
    } else {
        warnings.push(runtime_remediation(target, &sdk_hit, &runtime, inputs.policy));
        match inputs.policy {
            PartialPolicy::Degrade => BuildMode::GracefulDegraded,
            PartialPolicy::Stub => BuildMode::Stub,
        }
    };

    if mode.has_sdk() && credential.is_none() && target.credential.has_markers() {
        warnings.push(credential_remediation(target, &sdk_hit));
    }

    let runtime_artifacts = match &runtime {
        ArtifactVerdict::Present {
            hit, provenance, ..
        } => hit
            .markers
            .iter()
            .map(|name| RuntimeArtifact {
                source: hit.marker_dir.join(name),
                file_name: name.clone(),
                provenance: *provenance,
            })
            .collect(),
        ArtifactVerdict::Absent { .. } => Vec::new(),
    };

    let parts = if mode.has_sdk() {
        Parts {
            sdk: Some(sdk_paths(target, &sdk_hit)),
            runtime: runtime_artifacts,
            credential,
            delay_load: if target.delay_load {
                target.runtime.markers.clone()
            } else {
                Vec::new()
            },
            system_libraries: target.system_libraries.clone(),
            frameworks: target.frameworks.clone(),
            build,
        }
    } else {
        Parts {
            credential,
            build,
            ..Parts::default()
        }
    };
    finish(inputs, mode, parts, warnings.into_inner(), reporter)
}

fn locate_sdk<'a>(target: &PlatformInputs, reporter: &dyn Reporter) -> Phase<'a> {
    match locate(ArtifactClass::Sdk, &target.sdk_candidates, &target.sdk, reporter) {
        ArtifactVerdict::Present { hit, .. } => Phase::SdkPresent(hit),
        ArtifactVerdict::Absent { .. } => Phase::SdkAbsent,
    }
}

fn build_gate<'a>(
    target: &'a PlatformInputs,
    attempted: bool,
    warnings: &mut Warnings<'_>,
) -> Option<&'a BuildRequest> {
    if attempted {
        return None;
    }
    let request = target.auto_build.as_ref()?;
    if !request.working_dir.is_dir() {
        warnings.push(format!(
            "auto-build skipped: {} does not exist",
            request.working_dir.display()
        ));
        return None;
    }
    Some(request)
}

fn locate_credential(
    target: &PlatformInputs,
    sdk: Option<&ProbeMatch>,
    reporter: &dyn Reporter,
) -> Option<PathBuf> {
    if !target.credential.has_markers() {
        return None;
    }
    let mut candidates = Vec::with_capacity(target.credential_candidates.len() + 1);
    // The SDK root keeps the SDK's tier, so it is tried first only within it.
    if let Some(sdk) = sdk.filter(|_| target.credential_in_sdk_root) {
        candidates.push(CandidatePath {
            origin: "sdk root".to_string(),
            ..sdk.candidate.clone()
        });
    }
    candidates.extend(target.credential_candidates.iter().cloned());

    locate(
        ArtifactClass::Credential,
        &candidates,
        &target.credential,
        reporter,
    )
    .hit()
    .and_then(|hit| hit.marker_paths().next())
}

fn sdk_paths(target: &PlatformInputs, hit: &ProbeMatch) -> SdkPaths {
    let include_dirs: Vec<PathBuf> = hit.subpath(INCLUDE).map(Path::to_path_buf).into_iter().collect();
    let library_dirs: Vec<PathBuf> = hit.subpath(LIB).map(Path::to_path_buf).into_iter().collect();
    let link_libraries = target
        .link_libraries
        .iter()
        .filter_map(|name| {
            library_dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|path| path.is_file())
        })
        .collect();

    SdkPaths {
        root: hit.candidate.root.clone(),
        tier: hit.candidate.tier,
        origin: hit.candidate.origin.clone(),
        include_dirs,
        library_dirs,
        link_libraries,
        api_markers: hit.optional_markers.clone(),
    }
}

#[derive(Default)]
struct Parts {
    sdk: Option<SdkPaths>,
    runtime: Vec<RuntimeArtifact>,
    credential: Option<PathBuf>,
    delay_load: Vec<String>,
    system_libraries: Vec<String>,
    frameworks: Vec<String>,
    build: Option<BuildAttemptOutcome>,
}

fn finish(
    inputs: &ResolveInputs,
    mode: BuildMode,
    parts: Parts,
    warnings: Vec<String>,
    reporter: &dyn Reporter,
) -> CapabilityDecision {
    let has_credential = parts.credential.is_some();
    let features = inputs
        .features
        .iter()
        .map(|(name, requirement)| {
            (
                name.clone(),
                feature_available(*requirement, mode, has_credential),
            )
        })
        .collect();

    reporter.info(&format!("{}: {mode} build for {}", inputs.module, inputs.platform));

    CapabilityDecision {
        module: inputs.module.clone(),
        platform: inputs.platform,
        mode,
        features,
        sdk: parts.sdk,
        runtime: parts.runtime,
        credential: parts.credential,
        delay_load: parts.delay_load,
        system_libraries: parts.system_libraries,
        frameworks: parts.frameworks,
        platform_definitions: inputs
            .target
            .as_ref()
            .map(|t| t.definitions.clone())
            .unwrap_or_default(),
        build: parts.build,
        warnings,
    }
}

/// Records warnings in order and forwards each one to the reporter.
struct Warnings<'r> {
    reporter: &'r dyn Reporter,
    messages: Vec<String>,
}

impl<'r> Warnings<'r> {
    fn new(reporter: &'r dyn Reporter) -> Self {
        Self {
            reporter,
            messages: Vec::new(),
        }
    }

    fn push(&mut self, message: String) {
        self.reporter.warning(&message);
        self.messages.push(message);
    }

    fn into_inner(self) -> Vec<String> {
        self.messages
    }
}

fn env_vars(candidates: &[CandidatePath]) -> Vec<&str> {
    candidates
        .iter()
        .filter_map(|c| c.origin.strip_prefix('$'))
        .collect()
}

fn sdk_remediation(target: &PlatformInputs) -> String {
    let mut msg = format!(
        "sdk not found in {} location(s); building stub",
        target.sdk_candidates.len()
    );
    let vars = env_vars(&target.sdk_candidates);
    if !vars.is_empty() {
        msg.push_str(&format!(". Set {} to an installation", vars.join(" or ")));
    }
    msg
}

fn build_remediation(request: &BuildRequest, outcome: &BuildAttemptOutcome) -> String {
    let command = std::iter::once(request.toolchain.program.as_str())
        .chain(request.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    match outcome {
        BuildAttemptOutcome::ToolchainUnavailable => format!(
            "auto-build skipped: {} is not installed. Install it, then run `{command}` in {}",
            request.toolchain.program,
            request.working_dir.display()
        ),
        other => format!(
            "auto-build {other}. Run `{command}` in {} manually",
            request.working_dir.display()
        ),
    }
}

fn runtime_remediation(
    target: &PlatformInputs,
    sdk: &ProbeMatch,
    runtime: &ArtifactVerdict,
    policy: PartialPolicy,
) -> String {
    let consequence = match policy {
        PartialPolicy::Degrade => "linking is deferred and the feature is disabled until they load",
        PartialPolicy::Stub => "building stub",
    };
    match runtime.hit() {
        Some(hit) => format!(
            "runtime binaries found at {} but the sdk is at {}; {consequence}",
            hit.marker_dir.display(),
            sdk.candidate.root.display()
        ),
        None => format!(
            "runtime binaries ({}) not found; {consequence}",
            target.runtime.markers.join(", ")
        ),
    }
}

fn credential_remediation(target: &PlatformInputs, sdk: &ProbeMatch) -> String {
    let mut msg = format!(
        "license not found; the feature will fail its license check at runtime. Place {} in {}",
        target.credential.markers.join(" or "),
        sdk.candidate.root.display()
    );
    let vars = env_vars(&target.credential_candidates);
    if !vars.is_empty() {
        msg.push_str(&format!(" or set {}", vars.join(" or ")));
    }
    msg
}
