//! Command implementations

pub mod check;
pub mod new;
pub mod resolve;

use optdep_core::MANIFEST_FILE;
use std::path::{Path, PathBuf};

/// A manifest argument may name the file or the module directory.
pub fn manifest_path(arg: &Path) -> PathBuf {
    if arg.is_dir() {
        arg.join(MANIFEST_FILE)
    } else {
        arg.to_path_buf()
    }
}
