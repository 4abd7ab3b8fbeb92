//! Shared types for optional native dependency resolution.
//!
//! This crate holds the leaf data model: candidate locations and their
//! priority tiers, probe requirements and results, artifact verdicts, build
//! outcomes and modes, and the [`Platform`] naming table. It has no I/O.

pub mod library;
pub mod platform;
pub mod probe;
pub mod types;

// Re-exports
pub use library::{LibraryName, LibraryNameError};
pub use platform::{Platform, PlatformParseError};
pub use probe::*;
pub use types::*;
