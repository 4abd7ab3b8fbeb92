//! Target platform table.
//!
//! Every platform-conditional decision the resolver makes goes through this
//! type: library filename patterns, the executable suffix, and the
//! environment variable the dynamic loader searches. Per-module library sets
//! live in the manifest; this table only knows naming conventions.
//!
//! # Example
//!
//! ```
//! use optdep_schema::Platform;
//!
//! assert_eq!(Platform::Windows.shared_library_name("rivermax"), "rivermax.dll");
//! assert_eq!(Platform::Linux.shared_library_name("rivermax"), "librivermax.so");
//! ```

/// Error returned when a platform name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown platform: {0}")]
pub struct PlatformParseError(pub String);

/// Operating system family a module is configured for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// 64-bit Windows (DLLs, import libraries, `PATH` loader search).
    Windows,
    /// Linux (ELF shared objects, `LD_LIBRARY_PATH`).
    Linux,
    /// macOS (dylibs, `DYLD_LIBRARY_PATH`).
    Macos,
}

impl Platform {
    /// All platforms, in table order.
    pub const ALL: [Platform; 3] = [Self::Windows, Self::Linux, Self::Macos];

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Lowercase name, matching the manifest's `[platform.<name>]` keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
        }
    }

    /// File name of a runtime shared library (`foo.dll`, `libfoo.so`, `libfoo.dylib`).
    pub fn shared_library_name(&self, name: &str) -> String {
        match self {
            Self::Windows => format!("{name}.dll"),
            Self::Linux => format!("lib{name}.so"),
            Self::Macos => format!("lib{name}.dylib"),
        }
    }

    /// File name of a static archive (`foo.lib`, `libfoo.a`).
    pub fn static_library_name(&self, name: &str) -> String {
        match self {
            Self::Windows => format!("{name}.lib"),
            Self::Linux | Self::Macos => format!("lib{name}.a"),
        }
    }

    /// File name the linker is pointed at for a dynamically linked library.
    ///
    /// On Windows this is the import library; elsewhere the linker consumes
    /// the shared object directly.
    pub fn import_library_name(&self, name: &str) -> String {
        match self {
            Self::Windows => format!("{name}.lib"),
            Self::Linux | Self::Macos => self.shared_library_name(name),
        }
    }

    /// Executable file name for a program (`cargo.exe` on Windows).
    pub fn executable_name(&self, program: &str) -> String {
        match self {
            Self::Windows if !program.ends_with(".exe") => format!("{program}.exe"),
            _ => program.to_string(),
        }
    }

    /// Environment variable the dynamic loader consults for shared libraries.
    pub fn library_search_var(&self) -> &'static str {
        match self {
            Self::Windows => "PATH",
            Self::Linux => "LD_LIBRARY_PATH",
            Self::Macos => "DYLD_LIBRARY_PATH",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win64" | "win" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "mac" | "darwin" => Ok(Self::Macos),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_patterns() {
        assert_eq!(Platform::Windows.static_library_name("ndi"), "ndi.lib");
        assert_eq!(Platform::Macos.static_library_name("ndi"), "libndi.a");
        assert_eq!(Platform::Linux.import_library_name("rivermax"), "librivermax.so");
        assert_eq!(Platform::Windows.import_library_name("rivermax"), "rivermax.lib");
        assert_eq!(Platform::Macos.shared_library_name("dpcp"), "libdpcp.dylib");
    }

    #[test]
    fn test_executable_name() {
        assert_eq!(Platform::Windows.executable_name("cargo"), "cargo.exe");
        assert_eq!(Platform::Windows.executable_name("cargo.exe"), "cargo.exe");
        assert_eq!(Platform::Linux.executable_name("cargo"), "cargo");
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Win64".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!("darwin".parse::<Platform>(), Ok(Platform::Macos));
        assert!("beos".parse::<Platform>().is_err());
    }
}
