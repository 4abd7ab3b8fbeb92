use std::path::{Path, PathBuf};

use crate::env::EnvSnapshot;

/// Returns the optdep state directory, or None if the user's home cannot be resolved.
pub fn try_optdep_home(env: &EnvSnapshot) -> Option<PathBuf> {
    if let Some(val) = env.path_var("OPTDEP_HOME") {
        return Some(val);
    }
    env.home_dir().map(|h| h.join(".optdep"))
}

/// Logs directory: ~/.optdep/logs
pub fn log_dir(home: &Path) -> PathBuf {
    home.join("logs")
}

/// Generate a build log path for a module
pub fn build_log_path(home: &Path, module: &str) -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    log_dir(home).join(format!("build-{module}-{timestamp}.log"))
}

/// Expand a manifest path: `~/` is the home directory, relative paths are
/// taken from `base`, absolute paths are kept.
pub fn expand(path: &Path, base: &Path, env: &EnvSnapshot) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = env.home_dir() {
            return home.join(rest);
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
