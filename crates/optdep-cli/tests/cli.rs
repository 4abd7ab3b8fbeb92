//! Integration tests for the optdep CLI binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[module]
name = "Demo"

[sdk]
bundled = ["ThirdParty/Demo"]
markers_in = ["include"]
markers = ["demo.h"]

[runtime]
search_path = false

[credential]
files = ["demo.lic"]

[features]
DEMO_AVAILABLE = "sdk"
DEMO_RUNTIME = "runtime"
DEMO_LICENSED = "full"

[platform.linux]
runtime = ["shared:demo"]
link = ["import:demo"]
definitions = ["__linux__"]
"#;

/// A module directory with its own optdep home
struct TestContext {
    temp_dir: TempDir,
    module: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let module = temp_dir.path().join("Demo");
        fs::create_dir_all(&module).expect("failed to create module dir");
        Self { temp_dir, module }
    }

    fn with_manifest(self) -> Self {
        fs::write(self.module.join("optdep.toml"), MANIFEST).unwrap();
        self
    }

    fn install_sdk(&self, runtime: bool) -> PathBuf {
        let root = self.module.join("ThirdParty/Demo");
        fs::create_dir_all(root.join("include")).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("include/demo.h"), "").unwrap();
        if runtime {
            fs::write(root.join("lib/libdemo.so"), "elf").unwrap();
        }
        root
    }

    fn optdep(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_optdep"));
        cmd.env("HOME", self.temp_dir.path())
            .env("OPTDEP_HOME", self.temp_dir.path().join(".optdep"))
            .env("OPTDEP_PLATFORM", "linux")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.optdep().args(args).output().expect("failed to run optdep")
    }

    fn resolve_json(&self, extra: &[&str]) -> serde_json::Value {
        let module = self.module.to_string_lossy().to_string();
        let mut args = vec!["resolve", module.as_str(), "--format", "json", "--no-build"];
        args.extend_from_slice(extra);
        let output = self.run(&args);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_new_then_check() {
    let ctx = TestContext::new();
    let dir = ctx.temp_dir.path().join("Fresh");
    let dir_arg = dir.to_string_lossy().to_string();

    let output = ctx.run(&["new", "fresh-sdk", "--output-dir", &dir_arg]);
    assert!(output.status.success());
    assert!(dir.join("optdep.toml").exists());

    let output = ctx.run(&["check", &dir_arg]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Module: fresh-sdk"));
    assert!(text.contains("Platforms: linux, windows"));

    // never overwrites
    assert!(!ctx.run(&["new", "fresh-sdk", "--output-dir", &dir_arg]).status.success());
}

#[test]
fn test_check_rejects_invalid_manifest() {
    let ctx = TestContext::new();
    fs::write(
        ctx.module.join("optdep.toml"),
        "[module]\nname = \"Demo\"\n[sdk]\nmarkers = []\n",
    )
    .unwrap();
    let output = ctx.run(&["check", &ctx.module.to_string_lossy()]);
    assert!(!output.status.success());
}

#[test]
fn test_resolve_without_sdk_is_stub() {
    let ctx = TestContext::new().with_manifest();
    let json = ctx.resolve_json(&[]);
    assert_eq!(json["decision"]["mode"], "stub");
    assert_eq!(json["decision"]["features"]["DEMO_AVAILABLE"], false);
    assert!(json.get("staging").is_none());
}

#[test]
fn test_resolve_partial_sdk_degrades() {
    let ctx = TestContext::new().with_manifest();
    ctx.install_sdk(false);
    let json = ctx.resolve_json(&[]);
    assert_eq!(json["decision"]["mode"], "graceful_degraded");
    assert_eq!(json["decision"]["features"]["DEMO_AVAILABLE"], true);
    assert_eq!(json["decision"]["features"]["DEMO_RUNTIME"], false);
}

#[test]
fn test_resolve_and_stage() {
    let ctx = TestContext::new().with_manifest();
    let root = ctx.install_sdk(true);
    fs::write(root.join("demo.lic"), "license").unwrap();

    let out = ctx.temp_dir.path().join("Binaries");
    let inputs = ctx.temp_dir.path().join("packaging.json");
    let json = ctx.resolve_json(&[
        "--stage-to",
        &out.to_string_lossy(),
        "--packaging-inputs",
        &inputs.to_string_lossy(),
    ]);

    assert_eq!(json["decision"]["mode"], "full");
    assert_eq!(json["decision"]["features"]["DEMO_LICENSED"], true);
    assert_eq!(json["staging"]["copied"], 2);
    assert_eq!(fs::read_to_string(out.join("libdemo.so")).unwrap(), "elf");
    assert_eq!(fs::read_to_string(out.join("demo.lic")).unwrap(), "license");

    let listed: Vec<PathBuf> =
        serde_json::from_str(&fs::read_to_string(&inputs).unwrap()).unwrap();
    assert_eq!(listed.len(), 2);

    // second pass copies nothing
    let json = ctx.resolve_json(&["--stage-to", &out.to_string_lossy()]);
    assert_eq!(json["staging"]["copied"], 0);
}

#[test]
fn test_defines_format() {
    let ctx = TestContext::new().with_manifest();
    ctx.install_sdk(true);
    let module = ctx.module.to_string_lossy().to_string();
    let output = ctx.run(&["resolve", &module, "--format", "defines", "--no-build"]);
    assert!(output.status.success());

    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "DEMO_AVAILABLE=1",
            "DEMO_LICENSED=0",
            "DEMO_RUNTIME=1",
            "__linux__",
        ]
    );
}

#[test]
fn test_unsupported_platform_is_stub() {
    let ctx = TestContext::new().with_manifest();
    ctx.install_sdk(true);
    let module = ctx.module.to_string_lossy().to_string();
    let output = ctx
        .optdep()
        .args(["resolve", &module, "--platform", "macos", "--no-build"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Demo (macos): stub"));
}

#[test]
fn test_resolve_missing_manifest_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["resolve", &ctx.module.to_string_lossy()]);
    assert!(!output.status.success());
    assert!(!ctx.module.join("optdep.toml").exists());
}
