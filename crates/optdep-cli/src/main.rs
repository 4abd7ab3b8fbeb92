//! optdep - optional native dependency resolution CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use optdep_cli::cmd;
use optdep_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flags
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Resolve(args) => cmd::resolve::resolve(&args),
        Commands::Check { manifest } => cmd::check::check(&manifest),
        Commands::New { name, output_dir } => cmd::new::new(&name, &output_dir),
    }
}
