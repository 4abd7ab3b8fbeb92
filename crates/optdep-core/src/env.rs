//! Environment snapshot.
//!
//! Candidate derivation reads environment variables and well-known
//! directories. Capturing them once per pass keeps every later step a pure
//! function of its inputs, and lets tests describe an environment without
//! touching the process environment.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Immutable view of environment variables and user directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<OsString, OsString>,
    home: Option<PathBuf>,
    local_data: Option<PathBuf>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
            home: dirs::home_dir(),
            local_data: dirs::data_local_dir(),
        }
    }

    /// An environment with no variables and no known directories.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn with_var(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the user's home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Set the per-user local application data directory.
    pub fn with_local_data(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_data = Some(dir.into());
        self
    }

    /// Value of `key`. Unset and empty variables both read as `None`.
    pub fn var(&self, key: &str) -> Option<&OsStr> {
        self.vars
            .get(OsStr::new(key))
            .map(OsString::as_os_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `key` as a path.
    pub fn path_var(&self, key: &str) -> Option<PathBuf> {
        self.var(key).map(PathBuf::from)
    }

    /// Entries of a `PATH`-style variable, empty entries dropped.
    pub fn split_paths(&self, key: &str) -> Vec<PathBuf> {
        self.var(key)
            .map(|v| {
                std::env::split_paths(v)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The user's home directory.
    pub fn home_dir(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }

    /// The per-user local application data directory (`%LOCALAPPDATA%`).
    pub fn local_data_dir(&self) -> Option<&PathBuf> {
        self.local_data.as_ref()
    }
}
