//! Reporter trait for dependency injection
//!
//! Resolution is a set of pure functions; every diagnostic they produce goes
//! through a [`Reporter`] instead of being printed. One event is emitted per
//! probe, build and staging decision.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use optdep_schema::{ArtifactClass, ArtifactVerdict, BuildAttemptOutcome, ProbeResult};

use crate::stager::{StageDecision, StagingAction};

/// Sink for resolution diagnostics.
pub trait Reporter: Send + Sync {
    /// A single candidate was probed for an artifact class.
    fn probed(&self, class: ArtifactClass, result: &ProbeResult);

    /// The locator settled on a verdict for an artifact class.
    fn located(&self, verdict: &ArtifactVerdict);

    /// An external build is about to be spawned.
    fn build_started(&self, program: &Path, working_dir: &Path);

    /// One line of combined build output.
    fn build_output(&self, line: &str);

    /// The external build finished (or was never started).
    fn build_finished(&self, outcome: &BuildAttemptOutcome);

    /// A staging action was planned or performed.
    fn staged(&self, action: &StagingAction);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn probed(&self, class: ArtifactClass, result: &ProbeResult) {
        (**self).probed(class, result);
    }
    fn located(&self, verdict: &ArtifactVerdict) {
        (**self).located(verdict);
    }
    fn build_started(&self, program: &Path, working_dir: &Path) {
        (**self).build_started(program, working_dir);
    }
    fn build_output(&self, line: &str) {
        (**self).build_output(line);
    }
    fn build_finished(&self, outcome: &BuildAttemptOutcome) {
        (**self).build_finished(outcome);
    }
    fn staged(&self, action: &StagingAction) {
        (**self).staged(action);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn probed(&self, _: ArtifactClass, _: &ProbeResult) {}
    fn located(&self, _: &ArtifactVerdict) {}
    fn build_started(&self, _: &Path, _: &Path) {}
    fn build_output(&self, _: &str) {}
    fn build_finished(&self, _: &BuildAttemptOutcome) {}
    fn staged(&self, _: &StagingAction) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}

/// Forwards every event to `tracing`, one line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn probed(&self, class: ArtifactClass, result: &ProbeResult) {
        match result {
            ProbeResult::Found(hit) => tracing::debug!(
                class = %class,
                root = %hit.candidate.root.display(),
                tier = %hit.candidate.tier,
                markers = ?hit.markers,
                "candidate matched"
            ),
            ProbeResult::NotFound { candidate, reason } => tracing::debug!(
                class = %class,
                root = %candidate.root.display(),
                tier = %candidate.tier,
                %reason,
                "candidate rejected"
            ),
        }
    }

    fn located(&self, verdict: &ArtifactVerdict) {
        match verdict {
            ArtifactVerdict::Present {
                class,
                hit,
                provenance,
            } => tracing::info!(
                "{class}: using {} ({:?})",
                hit.candidate,
                provenance
            ),
            ArtifactVerdict::Absent { class } => tracing::info!("{class}: not found"),
        }
    }

    fn build_started(&self, program: &Path, working_dir: &Path) {
        tracing::info!(
            "building with {} in {}",
            program.display(),
            working_dir.display()
        );
    }

    fn build_output(&self, line: &str) {
        tracing::info!("{line}");
    }

    fn build_finished(&self, outcome: &BuildAttemptOutcome) {
        if outcome.is_success() {
            tracing::info!("build {outcome}");
        } else {
            tracing::warn!("build {outcome}");
        }
    }

    fn staged(&self, action: &StagingAction) {
        tracing::debug!(
            source = %action.source.display(),
            destination = %action.destination.display(),
            decision = ?action.decision,
            "staging"
        );
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
}

/// A recorded reporter event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// See [`Reporter::probed`].
    Probed {
        /// Artifact class.
        class: ArtifactClass,
        /// Probed root.
        root: PathBuf,
        /// Whether the probe succeeded.
        found: bool,
    },
    /// See [`Reporter::located`].
    Located(ArtifactVerdict),
    /// See [`Reporter::build_started`].
    BuildStarted(PathBuf),
    /// See [`Reporter::build_output`].
    BuildOutput(String),
    /// See [`Reporter::build_finished`].
    BuildFinished(BuildAttemptOutcome),
    /// See [`Reporter::staged`].
    Staged(PathBuf, StageDecision),
    /// See [`Reporter::info`].
    Info(String),
    /// See [`Reporter::warning`].
    Warning(String),
}

/// Records events in memory, for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl CollectingReporter {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.lock().clone()
    }

    /// Recorded warning messages, in order.
    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Warning(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of probes recorded for `class`.
    pub fn probe_count(&self, class: ArtifactClass) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, ReportEvent::Probed { class: c, .. } if *c == class))
            .count()
    }

    fn push(&self, event: ReportEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportEvent>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Reporter for CollectingReporter {
    fn probed(&self, class: ArtifactClass, result: &ProbeResult) {
        self.push(ReportEvent::Probed {
            class,
            root: result.candidate().root.clone(),
            found: result.is_found(),
        });
    }
    fn located(&self, verdict: &ArtifactVerdict) {
        self.push(ReportEvent::Located(verdict.clone()));
    }
    fn build_started(&self, program: &Path, _: &Path) {
        self.push(ReportEvent::BuildStarted(program.to_path_buf()));
    }
    fn build_output(&self, line: &str) {
        self.push(ReportEvent::BuildOutput(line.to_string()));
    }
    fn build_finished(&self, outcome: &BuildAttemptOutcome) {
        self.push(ReportEvent::BuildFinished(outcome.clone()));
    }
    fn staged(&self, action: &StagingAction) {
        self.push(ReportEvent::Staged(
            action.destination.clone(),
            action.decision,
        ));
    }
    fn info(&self, msg: &str) {
        self.push(ReportEvent::Info(msg.to_string()));
    }
    fn warning(&self, msg: &str) {
        self.push(ReportEvent::Warning(msg.to_string()));
    }
}
