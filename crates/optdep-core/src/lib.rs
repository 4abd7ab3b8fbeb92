//! Build-time resolution of optional native dependencies.
//!
//! A module declares where an optional SDK may live ([`manifest`]). One pass
//! probes the candidates ([`probe`], [`locate`]), optionally builds the SDK
//! once ([`invoker`]), settles on a [`BuildMode`](optdep_schema::BuildMode)
//! ([`resolver`]) and copies runtime files next to the output ([`stager`]).
//! Nothing in a pass is fatal: a missing dependency narrows the feature set
//! instead of failing the build.

pub mod decision;
pub mod env;
pub mod invoker;
pub mod locate;
pub mod manifest;
pub mod paths;
pub mod probe;
pub mod reporter;
pub mod resolver;
pub mod stager;

pub use decision::{CapabilityDecision, RuntimeArtifact, SdkPaths};
pub use env::EnvSnapshot;
pub use invoker::{BuildInvoker, BuildRequest, ProcessInvoker, ToolchainSpec, invoke_build};
pub use locate::{locate, locate_runtime};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestError};
pub use paths::*;
pub use probe::probe;
pub use reporter::{CollectingReporter, NullReporter, Reporter, TracingReporter};
pub use resolver::{PlatformInputs, ResolveInputs, resolve};
pub use stager::{StageDecision, StagingAction, StagingReport, execute_staging, plan_staging, stage};
