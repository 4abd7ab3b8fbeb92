//! Module manifest parsing.
//!
//! A manifest (`optdep.toml`) declares where a module's optional dependency
//! may live, how to recognise it, which libraries each platform links, and
//! which features depend on it. [`Manifest::inputs`] turns it into
//! [`ResolveInputs`] for one platform and one environment snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use optdep_schema::{
    CandidatePath, FeatureRequirement, LibraryName, PartialPolicy, Platform, ProbeRequirement,
    RequiredSubpath,
};
use serde::{Deserialize, Serialize};

use crate::env::EnvSnapshot;
use crate::invoker::{BuildRequest, DEFAULT_BUILD_TIMEOUT, ToolchainSpec, conventional_locations};
use crate::paths::expand;
use crate::resolver::{INCLUDE, LIB, PlatformInputs, ResolveInputs};

/// File name looked up by the CLI when no manifest path is given.
pub const MANIFEST_FILE: &str = "optdep.toml";

/// Upper bound for `[build] timeout_secs`: one day.
pub const MAX_BUILD_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Errors from loading or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("Failed to read {}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the manifest schema.
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// The manifest parsed but is inconsistent.
    #[error("Invalid manifest: {0}")]
    Invalid(String),

    /// A `[platform.<name>]` key is not a known platform.
    #[error("Unknown platform '{0}' in [platform] table")]
    UnknownPlatform(String),
}

/// Top-level manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub module: ModuleSection,
    #[serde(default)]
    pub policy: PolicySection,
    pub sdk: SdkSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    pub credential: Option<CredentialSection>,
    pub build: Option<BuildSection>,
    /// Feature name to availability rule.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureRequirement>,
    /// Per-platform tables, keyed by platform name. A platform without an
    /// entry is unsupported and always resolves to a stub.
    #[serde(default)]
    pub platform: BTreeMap<String, PlatformSection>,
}

/// `[module]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `[policy]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    /// SDK present but runtime binaries unusable: `degrade` or `stub`.
    #[serde(default)]
    pub partial: PartialPolicy,
}

/// `[sdk]`: candidate roots and the SDK layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkSection {
    /// Roots shipped with the module, relative to the manifest.
    #[serde(default)]
    pub bundled: Vec<PathBuf>,
    /// Environment variables naming a root.
    #[serde(default)]
    pub env: Vec<String>,
    /// System install locations shared by all platforms.
    #[serde(default)]
    pub system: Vec<PathBuf>,
    /// Header directory alternatives. Empty means no header directory.
    #[serde(default = "default_include")]
    pub include: Vec<PathBuf>,
    /// Library directory alternatives. Empty means no library directory.
    #[serde(default = "default_lib")]
    pub lib: Vec<PathBuf>,
    /// Directory alternatives holding the markers; empty is the root.
    #[serde(default)]
    pub markers_in: Vec<PathBuf>,
    /// At least one must exist.
    pub markers: Vec<LibraryName>,
    /// API-level markers, recorded when present.
    #[serde(default)]
    pub api_markers: Vec<String>,
}

fn default_include() -> Vec<PathBuf> {
    vec![PathBuf::from("include")]
}

fn default_lib() -> Vec<PathBuf> {
    vec![PathBuf::from("lib")]
}

/// `[runtime]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Directory alternatives holding runtime libraries under a root.
    #[serde(default = "default_lib")]
    pub dir: Vec<PathBuf>,
    /// Fall back to the loader search path. Only applies when resolving for
    /// the host platform.
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            dir: default_lib(),
            search_path: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[credential]`: license file lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialSection {
    /// Accepted license file names.
    pub files: Vec<String>,
    #[serde(default)]
    pub bundled: Vec<PathBuf>,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub system: Vec<PathBuf>,
    /// Look in the resolved SDK root first.
    #[serde(default = "default_true")]
    pub search_sdk_root: bool,
}

/// `[build]`: how to produce the SDK when it is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Run the build automatically.
    #[serde(default = "default_true")]
    pub auto: bool,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Version query arguments; `--version` when absent.
    pub version_args: Option<Vec<String>>,
    /// Build directory, relative to the manifest.
    pub working_dir: PathBuf,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Extra toolchain locations tried before the conventional ones.
    #[serde(default)]
    pub fallback_paths: Vec<PathBuf>,
}

fn default_program() -> String {
    "cargo".to_string()
}

fn default_args() -> Vec<String> {
    vec!["build".to_string(), "--release".to_string()]
}

fn default_timeout() -> u64 {
    DEFAULT_BUILD_TIMEOUT.as_secs()
}

/// `[platform.<name>]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformSection {
    /// System install locations for this platform.
    #[serde(default)]
    pub sdk_paths: Vec<PathBuf>,
    /// Overrides `[sdk] lib`.
    pub lib: Option<Vec<PathBuf>>,
    /// Overrides `[runtime] dir`.
    pub runtime_dir: Option<Vec<PathBuf>>,
    /// Runtime libraries; empty means nothing is needed at runtime.
    #[serde(default)]
    pub runtime: Vec<LibraryName>,
    /// Link libraries, looked up in the SDK library directory.
    #[serde(default)]
    pub link: Vec<LibraryName>,
    #[serde(default)]
    pub system_libraries: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
    /// Defer loading of every runtime library.
    #[serde(default)]
    pub delay_load: bool,
    /// System locations searched for the credential.
    #[serde(default)]
    pub credential_paths: Vec<PathBuf>,
}

impl Manifest {
    /// Load, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`Manifest::validate`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate manifest text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or fails validation.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.module.name.trim().is_empty() {
            return Err(ManifestError::Invalid("module name is empty".to_string()));
        }
        if self.sdk.markers.is_empty() {
            return Err(ManifestError::Invalid(
                "[sdk] needs at least one marker".to_string(),
            ));
        }
        if let Some(credential) = &self.credential {
            if credential.files.is_empty() {
                return Err(ManifestError::Invalid(
                    "[credential] needs at least one file name".to_string(),
                ));
            }
        }
        if let Some(build) = &self.build {
            if build.program.trim().is_empty() {
                return Err(ManifestError::Invalid("[build] program is empty".to_string()));
            }
            if build.timeout_secs == 0 || build.timeout_secs > MAX_BUILD_TIMEOUT_SECS {
                return Err(ManifestError::Invalid(format!(
                    "[build] timeout_secs must be between 1 and {MAX_BUILD_TIMEOUT_SECS}"
                )));
            }
        }
        for name in self.features.keys() {
            if !is_identifier(name) {
                return Err(ManifestError::Invalid(format!(
                    "feature '{name}' is not a valid preprocessor identifier"
                )));
            }
        }
        for key in self.platform.keys() {
            key.parse::<Platform>()
                .map_err(|_| ManifestError::UnknownPlatform(key.clone()))?;
        }
        Ok(())
    }

    /// The entry for `platform`, if the module supports it.
    pub fn platform_section(&self, platform: Platform) -> Option<&PlatformSection> {
        self.platform
            .iter()
            .find(|(key, _)| key.parse::<Platform>().ok() == Some(platform))
            .map(|(_, section)| section)
    }

    /// Resolver inputs for `platform`, with relative paths taken from
    /// `module_dir` and variables read from `env`.
    pub fn inputs(&self, module_dir: &Path, platform: Platform, env: &EnvSnapshot) -> ResolveInputs {
        ResolveInputs {
            module: self.module.name.clone(),
            platform,
            target: self
                .platform_section(platform)
                .map(|section| self.platform_inputs(section, module_dir, platform, env)),
            features: self.features.clone(),
            policy: self.policy.partial,
        }
    }

    fn platform_inputs(
        &self,
        section: &PlatformSection,
        module_dir: &Path,
        platform: Platform,
        env: &EnvSnapshot,
    ) -> PlatformInputs {
        let at = |p: &PathBuf| expand(p, module_dir, env);
        let names = |libs: &[LibraryName]| -> Vec<String> {
            libs.iter().map(|l| l.file_name(platform)).collect()
        };

        let sdk_candidates = candidates(
            &self.sdk.bundled,
            &self.sdk.env,
            self.sdk.system.iter().chain(&section.sdk_paths),
            module_dir,
            env,
        );

        let mut sdk = ProbeRequirement::with_markers(names(&self.sdk.markers))
            .markers_in(self.sdk.markers_in.iter().cloned())
            .optional(self.sdk.api_markers.iter().cloned());
        if !self.sdk.include.is_empty() {
            sdk = sdk.require(RequiredSubpath::new(INCLUDE, self.sdk.include.iter().cloned()));
        }
        let lib = section.lib.as_ref().unwrap_or(&self.sdk.lib);
        if !lib.is_empty() {
            sdk = sdk.require(RequiredSubpath::new(LIB, lib.iter().cloned()));
        }

        let runtime = if section.runtime.is_empty() {
            ProbeRequirement::default()
        } else {
            ProbeRequirement::with_markers(names(&section.runtime)).markers_in(
                section
                    .runtime_dir
                    .as_ref()
                    .unwrap_or(&self.runtime.dir)
                    .iter()
                    .cloned(),
            )
        };
        // The search path is split with the host's separator and names host
        // directories, so it only means something for a host build.
        let search_path = if self.runtime.search_path
            && !section.runtime.is_empty()
            && platform == Platform::current()
        {
            env.split_paths(platform.library_search_var())
        } else {
            Vec::new()
        };

        let (credential_candidates, credential, credential_in_sdk_root) = match &self.credential {
            Some(c) => (
                candidates(
                    &c.bundled,
                    &c.env,
                    c.system.iter().chain(&section.credential_paths),
                    module_dir,
                    env,
                ),
                ProbeRequirement::with_markers(c.files.iter().cloned()),
                c.search_sdk_root,
            ),
            None => (Vec::new(), ProbeRequirement::default(), false),
        };

        let auto_build = self.build.as_ref().filter(|b| b.auto).map(|b| {
            let host = Platform::current();
            let mut toolchain = ToolchainSpec::new(&b.program)
                .with_fallbacks(b.fallback_paths.iter().map(at))
                .with_fallbacks(conventional_locations(&b.program, host, env));
            if let Some(args) = &b.version_args {
                toolchain = toolchain.with_version_args(args.iter().cloned());
            }
            BuildRequest::new(toolchain, at(&b.working_dir))
                .with_args(b.args.iter().cloned())
                .with_timeout(Duration::from_secs(b.timeout_secs))
        });

        PlatformInputs {
            runtime_candidates: sdk_candidates.clone(),
            sdk_candidates,
            sdk,
            runtime,
            search_path,
            credential_candidates,
            credential,
            credential_in_sdk_root,
            link_libraries: names(&section.link),
            system_libraries: section.system_libraries.clone(),
            frameworks: section.frameworks.clone(),
            definitions: section.definitions.clone(),
            delay_load: section.delay_load,
            auto_build,
        }
    }

    /// A commented starting manifest for module `name`.
    pub fn template(name: &str) -> String {
        let var = format!("{}_SDK_PATH", name.to_uppercase().replace(['-', ' '], "_"));
        let define = format!("{}_AVAILABLE", name.to_uppercase().replace(['-', ' '], "_"));
        format!(
            r#"[module]
name = "{name}"
description = ""

[policy]
# SDK present but runtime libraries missing: "degrade" or "stub"
partial = "degrade"

[sdk]
bundled = ["ThirdParty/{name}"]
env = ["{var}"]
include = ["include"]
lib = ["lib/x64", "lib"]
markers_in = ["include"]
markers = ["{name}.h"]

[runtime]
dir = ["bin/x64", "bin", "lib"]
search_path = true

[features]
{define} = "sdk"

[platform.windows]
sdk_paths = ["C:/Program Files/{name}"]
runtime = ["shared:{name}"]
link = ["import:{name}"]
definitions = ["_WIN32"]
delay_load = true

[platform.linux]
sdk_paths = ["/opt/{name}", "/usr/local/{name}"]
runtime = ["shared:{name}"]
link = ["import:{name}"]
system_libraries = ["pthread"]
definitions = ["__linux__"]
"#
        )
    }
}

fn candidates<'a>(
    bundled: &[PathBuf],
    vars: &[String],
    system: impl Iterator<Item = &'a PathBuf>,
    module_dir: &Path,
    env: &EnvSnapshot,
) -> Vec<CandidatePath> {
    let bundled = bundled
        .iter()
        .map(|p| CandidatePath::bundled(expand(p, module_dir, env)));
    let from_env = vars
        .iter()
        .filter_map(|var| env.path_var(var).map(|p| CandidatePath::environment(var, p)));
    let system = system.map(|p| CandidatePath::system(expand(p, module_dir, env)));
    bundled.chain(from_env).chain(system).collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use optdep_schema::Tier;

    const RIVERMAX: &str = r#"
[module]
name = "Rship2110"

[sdk]
bundled = ["ThirdParty/Rivermax"]
env = ["RIVERMAX_SDK_PATH"]
markers_in = ["include"]
markers = ["rivermax_api.h", "rivermax.h"]
api_markers = ["rivermax_deprecated.h"]

[runtime]
dir = ["bin/x64", "bin"]

[credential]
files = ["rivermax.lic", "license.lic"]
bundled = ["ThirdParty/Rivermax"]
env = ["RIVERMAX_LICENSE_PATH"]

[features]
RSHIP_RIVERMAX_AVAILABLE = "sdk"
RSHIP_GPUDIRECT_AVAILABLE = "full"
RSHIP_IPMX_AVAILABLE = "always"

[platform.windows]
sdk_paths = ["C:/Program Files/Mellanox/Rivermax"]
lib = ["lib/x64", "lib"]
runtime = ["shared:rivermax", "shared:dpcp"]
link = ["import:rivermax"]
system_libraries = ["Ws2_32.lib"]
definitions = ["_WIN32", "RSHIP_PLATFORM_WINDOWS=1"]
delay_load = true
credential_paths = ["C:/ProgramData/Rivermax"]

[platform.linux]
sdk_paths = ["/opt/mellanox/rivermax"]
runtime_dir = ["lib"]
runtime = ["shared:rivermax"]
link = ["import:rivermax"]
system_libraries = ["pthread", "rt"]
definitions = ["__linux__"]
"#;

    #[test]
    fn test_parse_and_expand_windows() {
        let manifest = Manifest::parse(RIVERMAX).unwrap();
        let env = EnvSnapshot::empty().with_var("RIVERMAX_SDK_PATH", "D:/sdk");
        let inputs = manifest.inputs(Path::new("/plugin"), Platform::Windows, &env);

        assert_eq!(inputs.module, "Rship2110");
        assert_eq!(inputs.policy, PartialPolicy::Degrade);
        let target = inputs.target.unwrap();

        let tiers: Vec<Tier> = target.sdk_candidates.iter().map(|c| c.tier).collect();
        assert_eq!(tiers, vec![Tier::Bundled, Tier::Environment, Tier::System]);
        assert_eq!(
            target.sdk_candidates[0].root,
            PathBuf::from("/plugin/ThirdParty/Rivermax")
        );
        assert_eq!(target.sdk_candidates[1].origin, "$RIVERMAX_SDK_PATH");

        assert_eq!(
            target.runtime.markers,
            vec!["rivermax.dll".to_string(), "dpcp.dll".to_string()]
        );
        assert_eq!(
            target.runtime.marker_dir,
            vec![PathBuf::from("bin/x64"), PathBuf::from("bin")]
        );
        assert_eq!(target.link_libraries, vec!["rivermax.lib".to_string()]);
        assert_eq!(target.sdk.required[1].alternatives[0], PathBuf::from("lib/x64"));
        assert!(target.delay_load);
        assert!(target.credential_in_sdk_root);
        assert_eq!(target.credential_candidates.len(), 2);
        assert!(target.auto_build.is_none());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_uses_defaults_and_search_path() {
        let manifest = Manifest::parse(RIVERMAX).unwrap();
        let search = std::env::join_paths(["/usr/lib/mlx", "/opt/lib"]).unwrap();
        let env = EnvSnapshot::empty().with_var("LD_LIBRARY_PATH", search);
        let target = manifest
            .inputs(Path::new("/plugin"), Platform::Linux, &env)
            .target
            .unwrap();

        // unset env vars contribute no candidate
        assert_eq!(target.sdk_candidates.len(), 2);
        assert_eq!(target.runtime.markers, vec!["librivermax.so".to_string()]);
        assert_eq!(target.link_libraries, vec!["librivermax.so".to_string()]);
        assert_eq!(target.sdk.required[1].alternatives, vec![PathBuf::from("lib")]);
        assert_eq!(
            target.search_path,
            vec![PathBuf::from("/usr/lib/mlx"), PathBuf::from("/opt/lib")]
        );
    }

    #[test]
    fn test_search_path_is_ignored_for_cross_platform_builds() {
        let manifest = Manifest::parse(RIVERMAX).unwrap();
        let target = if Platform::current() == Platform::Windows {
            Platform::Linux
        } else {
            Platform::Windows
        };
        let env = EnvSnapshot::empty()
            .with_var("PATH", "/usr/bin")
            .with_var("LD_LIBRARY_PATH", "/usr/lib/mlx");
        let inputs = manifest.inputs(Path::new("/plugin"), target, &env).target.unwrap();
        assert!(inputs.search_path.is_empty());
    }

    #[test]
    fn test_missing_platform_entry_is_unsupported() {
        let manifest = Manifest::parse(RIVERMAX).unwrap();
        let inputs = manifest.inputs(Path::new("/plugin"), Platform::Macos, &EnvSnapshot::empty());
        assert!(inputs.target.is_none());
    }

    #[test]
    fn test_build_section() {
        let manifest = Manifest::parse(
            r#"
[module]
name = "RshipNDIStreaming"

[sdk]
bundled = ["ThirdParty/rship-ndi-sender"]
lib = ["target/release"]
markers_in = ["target/release"]
markers = ["static:rship_ndi_sender"]

[build]
working_dir = "ThirdParty/rship-ndi-sender"

[features]
RSHIP_HAS_NDI_SENDER = "sdk"

[platform.macos]
frameworks = ["Security", "CoreFoundation"]
"#,
        )
        .unwrap();
        let env = EnvSnapshot::empty().with_home("/home/dev");
        let target = manifest
            .inputs(Path::new("/plugin"), Platform::Macos, &env)
            .target
            .unwrap();

        assert_eq!(target.sdk.markers, vec!["librship_ndi_sender.a".to_string()]);
        assert!(!target.runtime.has_markers());
        assert!(target.search_path.is_empty());

        let build = target.auto_build.unwrap();
        assert_eq!(build.toolchain.program, "cargo");
        assert_eq!(build.args, vec!["build".to_string(), "--release".to_string()]);
        assert_eq!(build.working_dir, PathBuf::from("/plugin/ThirdParty/rship-ndi-sender"));
        assert_eq!(build.timeout, Duration::from_secs(300));
        assert!(
            build
                .toolchain
                .fallback_paths
                .iter()
                .any(|p| p.starts_with("/home/dev/.cargo/bin"))
        );
    }

    #[test]
    fn test_validation_errors() {
        let base = "[module]\nname = \"M\"\n[sdk]\nmarkers = [\"m.h\"]\n";
        assert!(Manifest::parse(base).is_ok());

        assert!(matches!(
            Manifest::parse("[module]\nname = \" \"\n[sdk]\nmarkers = [\"m.h\"]\n"),
            Err(ManifestError::Invalid(_))
        ));
        assert!(matches!(
            Manifest::parse("[module]\nname = \"M\"\n[sdk]\nmarkers = []\n"),
            Err(ManifestError::Invalid(_))
        ));
        assert!(matches!(
            Manifest::parse(&format!("{base}[platform.beos]\n")),
            Err(ManifestError::UnknownPlatform(key)) if key == "beos"
        ));
        assert!(matches!(
            Manifest::parse(&format!("{base}[features]\nHAS-SDK = \"sdk\"\n")),
            Err(ManifestError::Invalid(_))
        ));
        assert!(matches!(
            Manifest::parse(&format!("{base}[features]\nHAS_SDK = \"sometimes\"\n")),
            Err(ManifestError::Parse(_))
        ));
        assert!(matches!(
            Manifest::parse(&format!("{base}[build]\nworking_dir = \"x\"\ntimeout_secs = 0\n")),
            Err(ManifestError::Invalid(_))
        ));
        assert!(matches!(
            Manifest::parse(&format!(
                "{base}[build]\nworking_dir = \"x\"\ntimeout_secs = 9223372036854775807\n"
            )),
            Err(ManifestError::Invalid(_))
        ));
        assert!(
            Manifest::parse(&format!(
                "{base}[build]\nworking_dir = \"x\"\ntimeout_secs = {MAX_BUILD_TIMEOUT_SECS}\n"
            ))
            .is_ok()
        );
    }

    #[test]
    fn test_template_is_valid() {
        let manifest = Manifest::parse(&Manifest::template("my-sdk")).unwrap();
        assert_eq!(manifest.module.name, "my-sdk");
        assert!(manifest.features.contains_key("MY_SDK_AVAILABLE"));
        assert_eq!(manifest.platform.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load(Path::new("/definitely/not/optdep.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
