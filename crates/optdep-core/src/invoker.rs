//! External build invocation.
//!
//! Runs a single toolchain command to produce a missing dependency, for
//! example `cargo build --release` inside a bundled crate. The toolchain is
//! resolved first (by name, then at conventional install locations). A missing
//! toolchain is a normal outcome and nothing is spawned.
//!
//! Output from stdout and stderr is streamed line by line to the [`Reporter`],
//! prefixed with the program name, and optionally teed into a log file. The
//! child gets a hard wall-clock budget; when it runs over, it is killed and
//! the outcome is [`BuildAttemptOutcome::TimedOut`].
//!
//! Builds against one working directory never overlap within a process: every
//! invocation holds that directory's [`WorkdirLock`] for its whole duration.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use optdep_schema::{BuildAttemptOutcome, Platform};
use wait_timeout::ChildExt;

use crate::env::EnvSnapshot;
use crate::reporter::Reporter;

/// Wall-clock budget for a build when none is configured.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget for the toolchain version query.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of trailing output lines repeated in the failure warning.
const TAIL_LINES: usize = 20;

/// Output lines buffered between the reader threads and the caller.
const LINE_BUFFER: usize = 256;

/// How to find a toolchain executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSpec {
    /// Program name, resolved through `PATH` (e.g. `cargo`).
    pub program: String,
    /// Arguments of the version query that proves the program runs.
    pub version_args: Vec<String>,
    /// Files tried in order when the program is not on `PATH`.
    pub fallback_paths: Vec<PathBuf>,
}

impl ToolchainSpec {
    /// A toolchain queried with `--version` and no fallbacks.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            version_args: vec!["--version".to_string()],
            fallback_paths: Vec::new(),
        }
    }

    /// Replace the version query arguments.
    pub fn with_version_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.version_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append fallback locations.
    pub fn with_fallbacks(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.fallback_paths.extend(paths);
        self
    }

    /// Name used to prefix streamed output.
    pub fn display_name(&self) -> &str {
        Path::new(&self.program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.program)
    }
}

/// Conventional install locations for `program` on the host.
///
/// Covers the rustup proxy directory, the per-user `%LOCALAPPDATA%` tree on
/// Windows, and Homebrew and system prefixes elsewhere.
pub fn conventional_locations(program: &str, host: Platform, env: &EnvSnapshot) -> Vec<PathBuf> {
    let exe = host.executable_name(program);
    let mut paths = Vec::new();
    if let Some(home) = env.home_dir() {
        paths.push(home.join(".cargo").join("bin").join(&exe));
    }
    match host {
        Platform::Windows => {
            if let Some(local) = env.local_data_dir() {
                paths.push(local.join("cargo").join("bin").join(&exe));
            }
        }
        Platform::Linux | Platform::Macos => {
            for prefix in ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"] {
                paths.push(Path::new(prefix).join(&exe));
            }
        }
    }
    paths
}

/// A resolved toolchain executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Absolute path of the executable.
    pub executable: PathBuf,
    /// First line of the version query, when it was run.
    pub version: Option<String>,
}

/// Resolve the toolchain executable described by `spec`.
///
/// The program is looked up on `PATH` and accepted when its version query
/// exits zero within [`VERSION_PROBE_TIMEOUT`]. Otherwise the first existing
/// fallback file is used.
pub fn resolve_toolchain(spec: &ToolchainSpec, reporter: &dyn Reporter) -> Option<Toolchain> {
    if let Ok(path) = which::which(&spec.program) {
        match query_version(&path, &spec.version_args) {
            Some(version) => {
                reporter.info(&format!(
                    "found {} at {} ({})",
                    spec.program,
                    path.display(),
                    version.as_deref().unwrap_or("unknown version")
                ));
                return Some(Toolchain {
                    executable: path,
                    version,
                });
            }
            None => reporter.warning(&format!(
                "{} at {} did not answer its version query",
                spec.program,
                path.display()
            )),
        }
    }

    let fallback = spec.fallback_paths.iter().find(|p| p.is_file())?;
    reporter.info(&format!(
        "found {} at fallback location {}",
        spec.program,
        fallback.display()
    ));
    Some(Toolchain {
        executable: fallback.clone(),
        version: None,
    })
}

/// `Some(first line)` when the version query exits zero in time.
fn query_version(executable: &Path, args: &[String]) -> Option<Option<String>> {
    let mut cmd = Command::new(executable);
    cmd.args(args).stdin(Stdio::null());

    let mut first_line = None;
    let status = run_streaming(cmd, VERSION_PROBE_TIMEOUT, |line| {
        if first_line.is_none() && !line.trim().is_empty() {
            first_line = Some(line.trim().to_string());
        }
    })
    .ok()?;

    (status == RunStatus::Exited(Some(0))).then_some(first_line)
}

/// One build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Toolchain to run.
    pub toolchain: ToolchainSpec,
    /// Arguments passed to the toolchain.
    pub args: Vec<String>,
    /// Directory the build runs in.
    pub working_dir: PathBuf,
    /// Hard wall-clock budget.
    pub timeout: Duration,
    /// File receiving a copy of the streamed output.
    pub log_path: Option<PathBuf>,
}

impl BuildRequest {
    /// A request with no arguments, the default timeout and no log file.
    pub fn new(toolchain: ToolchainSpec, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_BUILD_TIMEOUT,
            log_path: None,
        }
    }

    /// Set the toolchain arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tee output into `path`.
    pub fn with_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }
}

/// The seam through which the resolver runs builds.
pub trait BuildInvoker {
    /// Perform exactly one build attempt.
    fn invoke(&self, request: &BuildRequest, reporter: &dyn Reporter) -> BuildAttemptOutcome;
}

/// Runs builds as real child processes via [`invoke_build`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl BuildInvoker for ProcessInvoker {
    fn invoke(&self, request: &BuildRequest, reporter: &dyn Reporter) -> BuildAttemptOutcome {
        invoke_build(request, reporter)
    }
}

/// Resolve the toolchain and run one build.
///
/// Never retries. Every outcome, including a missing toolchain, is reported
/// through [`Reporter::build_finished`].
pub fn invoke_build(request: &BuildRequest, reporter: &dyn Reporter) -> BuildAttemptOutcome {
    let outcome = match resolve_toolchain(&request.toolchain, reporter) {
        Some(toolchain) => run_build(request, &toolchain, reporter),
        None => {
            reporter.warning(&format!(
                "{} not found on PATH or in {} conventional locations",
                request.toolchain.program,
                request.toolchain.fallback_paths.len()
            ));
            BuildAttemptOutcome::ToolchainUnavailable
        }
    };
    reporter.build_finished(&outcome);
    outcome
}

fn run_build(
    request: &BuildRequest,
    toolchain: &Toolchain,
    reporter: &dyn Reporter,
) -> BuildAttemptOutcome {
    let lock = WorkdirLock::for_dir(&request.working_dir);
    let _guard = lock.lock();

    reporter.build_started(&toolchain.executable, &request.working_dir);

    let mut log = request
        .log_path
        .as_deref()
        .and_then(|path| match open_log(path) {
            Ok(file) => Some(file),
            Err(e) => {
                reporter.warning(&format!(
                    "cannot write build log {}: {e}",
                    path.display()
                ));
                None
            }
        });

    let mut cmd = Command::new(&toolchain.executable);
    cmd.args(&request.args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null());

    let prefix = request.toolchain.display_name();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    let status = run_streaming(cmd, request.timeout, |line| {
        reporter.build_output(&format!("[{prefix}] {line}"));
        if let Some(file) = log.as_mut() {
            if writeln!(file, "{line}").is_err() {
                log = None;
            }
        }
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    });

    let outcome = match status {
        Ok(RunStatus::Exited(Some(0))) => BuildAttemptOutcome::Succeeded,
        Ok(RunStatus::Exited(code)) => BuildAttemptOutcome::Failed { code },
        Ok(RunStatus::TimedOut) => BuildAttemptOutcome::TimedOut {
            after_secs: request.timeout.as_secs(),
        },
        Err(e) => {
            reporter.warning(&format!(
                "failed to spawn {}: {e}",
                toolchain.executable.display()
            ));
            BuildAttemptOutcome::Failed { code: None }
        }
    };

    if !outcome.is_success() && !tail.is_empty() {
        let mut msg = format!("build {outcome}. Last {} lines:", tail.len());
        for line in &tail {
            msg.push('\n');
            msg.push_str(line);
        }
        if let Some(path) = &request.log_path {
            msg.push_str(&format!("\nFull log: {}", path.display()));
        }
        reporter.warning(&msg);
    }

    outcome
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// How a streamed child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The process exited; `None` when it was terminated by a signal.
    Exited(Option<i32>),
    /// The process exceeded its budget and was killed.
    TimedOut,
}

/// Spawn `cmd`, feed every stdout and stderr line to `on_line`, and wait at
/// most `timeout` for it to exit.
///
/// Both streams are read on their own threads and funnelled through a
/// bounded channel, so `on_line` always runs on the calling thread and a
/// slow consumer throttles the child. The deadline is checked before every
/// line, so a child that never stops printing is still killed on time. A
/// `timeout` too large to add to the current instant means no deadline.
/// Invalid UTF-8 is replaced lossily.
///
/// # Errors
///
/// Returns an error only if the process cannot be spawned or waited on.
pub fn run_streaming(
    mut cmd: Command,
    timeout: Duration,
    mut on_line: impl FnMut(&str),
) -> std::io::Result<RunStatus> {
    // A budget too large to represent has no deadline.
    let deadline = Instant::now().checked_add(timeout);
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let (tx, rx) = mpsc::sync_channel::<String>(LINE_BUFFER);
    let mut streams: Vec<Box<dyn Read + Send>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        streams.push(Box::new(stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        streams.push(Box::new(stderr));
    }
    let readers: Vec<_> = streams
        .into_iter()
        .map(|stream| {
            let tx = tx.clone();
            thread::spawn(move || forward_lines(stream, &tx))
        })
        .collect();
    drop(tx);

    let mut expired = false;
    loop {
        let line = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    expired = true;
                    break;
                }
                rx.recv_timeout(remaining)
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match line {
            Ok(line) => on_line(&line),
            Err(RecvTimeoutError::Timeout) => {
                expired = true;
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Unblocks readers still waiting on a full buffer.
    drop(rx);

    let status = if expired {
        None
    } else if let Some(deadline) = deadline {
        child.wait_timeout(deadline.saturating_duration_since(Instant::now()))?
    } else {
        Some(child.wait()?)
    };

    match status {
        Some(status) => {
            for reader in readers {
                let _ = reader.join();
            }
            Ok(RunStatus::Exited(status.code()))
        }
        None => {
            // Readers may stay blocked while grandchildren hold the pipes, so
            // they are detached rather than joined.
            let _ = child.kill();
            let _ = child.wait();
            Ok(RunStatus::TimedOut)
        }
    }
}

fn forward_lines(stream: impl Read, tx: &mpsc::SyncSender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
        }
    }
}

type LockRegistry = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

static WORKDIR_LOCKS: OnceLock<LockRegistry> = OnceLock::new();

/// Process-wide mutex for one build working directory.
///
/// Directories are keyed by their canonical path, so `./crate` and
/// `/abs/crate` share a lock.
#[derive(Debug, Clone)]
pub struct WorkdirLock {
    dir: PathBuf,
    mutex: Arc<Mutex<()>>,
}

impl WorkdirLock {
    /// The lock for `dir`.
    pub fn for_dir(dir: &Path) -> Self {
        let key = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let registry = WORKDIR_LOCKS.get_or_init(LockRegistry::default);
        let mutex = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();
        Self { dir: key, mutex }
    }

    /// The canonical directory this lock guards.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Block until no other build runs in this directory.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the lock only if it is free.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, ()>> {
        match self.mutex.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CollectingReporter, NullReporter, ReportEvent};
    use tempfile::tempdir;

    #[test]
    fn test_conventional_locations() {
        let env = EnvSnapshot::empty()
            .with_home("/home/dev")
            .with_local_data("C:/Users/dev/AppData/Local");

        let unix = conventional_locations("cargo", Platform::Linux, &env);
        assert_eq!(unix[0], PathBuf::from("/home/dev/.cargo/bin/cargo"));
        assert!(unix.contains(&PathBuf::from("/opt/homebrew/bin/cargo")));
        assert_eq!(unix.last(), Some(&PathBuf::from("/usr/bin/cargo")));

        let windows = conventional_locations("cargo", Platform::Windows, &env);
        assert_eq!(
            windows,
            vec![
                PathBuf::from("/home/dev/.cargo/bin/cargo.exe"),
                PathBuf::from("C:/Users/dev/AppData/Local/cargo/bin/cargo.exe"),
            ]
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(ToolchainSpec::new("cargo").display_name(), "cargo");
        assert_eq!(
            ToolchainSpec::new("/usr/bin/cargo").display_name(),
            "cargo"
        );
    }

    #[test]
    fn test_missing_toolchain_is_unavailable() {
        let tmp = tempdir().unwrap();
        let spec = ToolchainSpec::new("optdep-no-such-toolchain")
            .with_fallbacks([tmp.path().join("bin/nothing")]);
        assert!(resolve_toolchain(&spec, &NullReporter).is_none());

        let reporter = CollectingReporter::new();
        let outcome = invoke_build(&BuildRequest::new(spec, tmp.path()), &reporter);
        assert_eq!(outcome, BuildAttemptOutcome::ToolchainUnavailable);
        assert!(
            !reporter
                .events()
                .iter()
                .any(|e| matches!(e, ReportEvent::BuildStarted(_)))
        );
    }

    #[test]
    fn test_fallback_location_is_used() {
        let tmp = tempdir().unwrap();
        let fallback = tmp.path().join("cargo");
        std::fs::write(&fallback, "").unwrap();

        let spec = ToolchainSpec::new("optdep-no-such-toolchain").with_fallbacks([
            tmp.path().join("missing"),
            fallback.clone(),
        ]);
        let toolchain = resolve_toolchain(&spec, &NullReporter).unwrap();
        assert_eq!(toolchain.executable, fallback);
        assert_eq!(toolchain.version, None);
    }

    #[test]
    fn test_workdir_lock_is_shared_per_directory() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();

        let first = WorkdirLock::for_dir(a.path());
        let again = WorkdirLock::for_dir(&a.path().join("."));
        let other = WorkdirLock::for_dir(b.path());
        assert_eq!(first.dir(), again.dir());

        let _held = first.lock();
        assert!(again.try_lock().is_none());
        assert!(other.try_lock().is_some());
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        fn sh() -> ToolchainSpec {
            // dash rejects --version, so the query runs a no-op script
            ToolchainSpec::new("sh").with_version_args(["-c", "true"])
        }

        #[test]
        fn test_resolves_sh_on_path() {
            let toolchain = resolve_toolchain(&sh(), &NullReporter).unwrap();
            assert!(toolchain.executable.is_absolute());
            assert_eq!(toolchain.version, None);
        }

        #[test]
        fn test_version_line_is_recorded() {
            let spec = ToolchainSpec::new("sh").with_version_args(["-c", "echo tool 1.2.3"]);
            let toolchain = resolve_toolchain(&spec, &NullReporter).unwrap();
            assert_eq!(toolchain.version.as_deref(), Some("tool 1.2.3"));
        }

        #[test]
        fn test_success_streams_both_streams() {
            let tmp = tempdir().unwrap();
            let reporter = CollectingReporter::new();
            let request = BuildRequest::new(sh(), tmp.path())
                .with_args(["-c", "echo compiling; echo warning >&2"]);

            let outcome = invoke_build(&request, &reporter);
            assert_eq!(outcome, BuildAttemptOutcome::Succeeded);

            let events = reporter.events();
            assert!(events.contains(&ReportEvent::BuildOutput("[sh] compiling".to_string())));
            assert!(events.contains(&ReportEvent::BuildOutput("[sh] warning".to_string())));
            assert!(events.contains(&ReportEvent::BuildFinished(
                BuildAttemptOutcome::Succeeded
            )));
            assert!(reporter.warnings().is_empty());
        }

        #[test]
        fn test_runs_in_working_directory() {
            let tmp = tempdir().unwrap();
            let request = BuildRequest::new(sh(), tmp.path()).with_args(["-c", "touch built"]);
            assert!(invoke_build(&request, &NullReporter).is_success());
            assert!(tmp.path().join("built").exists());
        }

        #[test]
        fn test_nonzero_exit_reports_tail() {
            let tmp = tempdir().unwrap();
            let reporter = CollectingReporter::new();
            let request = BuildRequest::new(sh(), tmp.path())
                .with_args(["-c", "for i in $(seq 1 30); do echo line$i; done; exit 3"]);

            let outcome = invoke_build(&request, &reporter);
            assert_eq!(outcome, BuildAttemptOutcome::Failed { code: Some(3) });

            let warnings = reporter.warnings();
            let tail = warnings.last().unwrap();
            assert!(tail.contains("Last 20 lines"));
            assert!(tail.contains("line30"));
            assert!(tail.contains("line11"));
            assert!(!tail.contains("line10\n"));
        }

        #[test]
        fn test_timeout_kills_child() {
            let tmp = tempdir().unwrap();
            let request = BuildRequest::new(sh(), tmp.path())
                .with_args(["-c", "echo started; exec sleep 30"])
                .with_timeout(Duration::from_secs(1));

            let started = Instant::now();
            let outcome = invoke_build(&request, &NullReporter);
            assert_eq!(outcome, BuildAttemptOutcome::TimedOut { after_secs: 1 });
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[test]
        fn test_timeout_kills_child_that_never_stops_printing() {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", "while :; do echo x; done"]);

            let started = Instant::now();
            let mut lines = 0usize;
            let status = run_streaming(cmd, Duration::from_secs(1), |_| {
                lines += 1;
                thread::sleep(Duration::from_micros(20));
            })
            .unwrap();
            assert_eq!(status, RunStatus::TimedOut);
            assert!(lines > 0);
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[test]
        fn test_unrepresentable_timeout_waits_for_exit() {
            let tmp = tempdir().unwrap();
            let request = BuildRequest::new(sh(), tmp.path())
                .with_args(["-c", "echo done"])
                .with_timeout(Duration::from_secs(u64::MAX));

            assert_eq!(
                invoke_build(&request, &NullReporter),
                BuildAttemptOutcome::Succeeded
            );
        }

        #[test]
        fn test_output_is_teed_to_log() {
            let tmp = tempdir().unwrap();
            let log = tmp.path().join("logs/build.log");
            let request = BuildRequest::new(sh(), tmp.path())
                .with_args(["-c", "echo one; echo two"])
                .with_log(&log);

            assert!(invoke_build(&request, &NullReporter).is_success());
            let content = std::fs::read_to_string(&log).unwrap();
            assert!(content.contains("one\n"));
            assert!(content.contains("two\n"));
        }
    }
}
