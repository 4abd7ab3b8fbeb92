//! optdep - optional native dependency resolution
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Decides, at build-configuration time, whether a module is built with full
//! support for an optional native SDK, with deferred loading, or as a stub.
//!
//! # Layout
//!
//! ```text
//! MyModule/
//! ├── optdep.toml          # candidate paths, layout, features
//! └── ThirdParty/<Sdk>/    # optional bundled copy, preferred over the system
//!
//! ~/.optdep/
//! └── logs/                # auto-build logs
//! ```

pub mod cmd;

use clap::{Args, Parser, Subcommand, ValueEnum};
use optdep_schema::Platform;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "optdep")]
#[command(author, version, about = "optdep - resolve optional native dependencies")]
pub struct Cli {
    /// Log every probe and build line
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve a module and print its capability decision
    Resolve(ResolveArgs),
    /// Validate a manifest
    Check {
        /// Manifest file or the directory containing optdep.toml
        #[arg(default_value = ".")]
        manifest: PathBuf,
    },
    /// Create a manifest template
    New {
        /// Module name
        name: String,
        /// Directory to create optdep.toml in
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Manifest file or the directory containing optdep.toml
    #[arg(default_value = ".")]
    pub manifest: PathBuf,

    /// Target platform (defaults to the host)
    #[arg(long, env = "OPTDEP_PLATFORM")]
    pub platform: Option<Platform>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Never run the auto-build
    #[arg(long)]
    pub no_build: bool,

    /// Copy runtime libraries and the license into this directory
    #[arg(long, value_name = "DIR")]
    pub stage_to: Option<PathBuf>,

    /// Write the staged files as a JSON list for the packaging step
    #[arg(long, value_name = "FILE", requires = "stage_to")]
    pub packaging_inputs: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable summary
    Text,
    /// The decision (and staging report) as JSON
    Json,
    /// One preprocessor definition per line
    Defines,
}
