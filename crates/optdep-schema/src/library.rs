//! Platform-independent library names.
//!
//! Manifests name libraries once and let the [`Platform`] table expand them:
//! `shared:rivermax` becomes `rivermax.dll` or `librivermax.so`,
//! `static:rship_ndi_sender` becomes `rship_ndi_sender.lib` or
//! `librship_ndi_sender.a`. A name without a prefix is a literal file name.

use serde::{Deserialize, Serialize};

use crate::Platform;

/// Errors produced when parsing a [`LibraryName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryNameError {
    /// The input (or the part after the prefix) is empty.
    #[error("Empty library name in '{0}'")]
    Empty(String),

    /// The prefix before `:` is not one of `shared`, `static`, `import`.
    #[error("Unknown library kind '{0}' (expected shared, static or import)")]
    UnknownKind(String),
}

/// A library file name, either literal or expanded per platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LibraryName {
    /// Literal file name, used as-is on every platform.
    File(String),
    /// Runtime shared library (`shared:<name>`).
    Shared(String),
    /// Static archive (`static:<name>`).
    Static(String),
    /// Link-time library for a dynamic dependency (`import:<name>`).
    Import(String),
}

impl LibraryName {
    /// Expand to the concrete file name for `platform`.
    pub fn file_name(&self, platform: Platform) -> String {
        match self {
            Self::File(name) => name.clone(),
            Self::Shared(name) => platform.shared_library_name(name),
            Self::Static(name) => platform.static_library_name(name),
            Self::Import(name) => platform.import_library_name(name),
        }
    }
}

impl std::str::FromStr for LibraryName {
    type Err = LibraryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((kind, name)) = s.split_once(':') else {
            if s.is_empty() {
                return Err(LibraryNameError::Empty(s.to_string()));
            }
            return Ok(Self::File(s.to_string()));
        };

        if name.is_empty() {
            return Err(LibraryNameError::Empty(s.to_string()));
        }
        let name = name.to_string();
        match kind {
            "shared" => Ok(Self::Shared(name)),
            "static" => Ok(Self::Static(name)),
            "import" => Ok(Self::Import(name)),
            other => Err(LibraryNameError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for LibraryName {
    type Error = LibraryNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LibraryName> for String {
    fn from(value: LibraryName) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for LibraryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(name) => write!(f, "{name}"),
            Self::Shared(name) => write!(f, "shared:{name}"),
            Self::Static(name) => write!(f, "static:{name}"),
            Self::Import(name) => write!(f, "import:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_per_platform() {
        let lib: LibraryName = "static:rship_ndi_sender".parse().unwrap();
        assert_eq!(lib.file_name(Platform::Windows), "rship_ndi_sender.lib");
        assert_eq!(lib.file_name(Platform::Linux), "librship_ndi_sender.a");

        let lib: LibraryName = "import:rivermax".parse().unwrap();
        assert_eq!(lib.file_name(Platform::Linux), "librivermax.so");
    }

    #[test]
    fn test_literal_name() {
        let lib: LibraryName = "rivermax_api.h".parse().unwrap();
        assert_eq!(lib, LibraryName::File("rivermax_api.h".to_string()));
        assert_eq!(lib.file_name(Platform::Macos), "rivermax_api.h");
    }

    #[test]
    fn test_rejects_bad_names() {
        assert_eq!(
            "dynamic:foo".parse::<LibraryName>(),
            Err(LibraryNameError::UnknownKind("dynamic".to_string()))
        );
        assert!(matches!(
            "shared:".parse::<LibraryName>(),
            Err(LibraryNameError::Empty(_))
        ));
        assert!(matches!("".parse::<LibraryName>(), Err(LibraryNameError::Empty(_))));
    }
}
