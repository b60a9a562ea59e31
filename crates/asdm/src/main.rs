//! ASDM CLI - site content engine.
//!
//! Provides commands for:
//! - `serve`: Start the JSON API server
//! - `resolve`: Resolve a browser location to a document
//! - `nav`: Print a section's sidebar tree
//! - `check`: Report manifest problems and missing document bodies

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, NavArgs, ResolveArgs, ServeArgs};
use error::CliError;
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ASDM - site content engine.
#[derive(Parser)]
#[command(name = "asdm", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server.
    Serve(ServeArgs),
    /// Resolve a location to a document.
    Resolve(ResolveArgs),
    /// Print the sidebar tree of a section.
    Nav(NavArgs),
    /// Check a section's manifest and content.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli.command) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match command {
            Commands::Serve(args) => args.execute(VERSION).await,
            Commands::Resolve(args) => args.execute().await,
            Commands::Nav(args) => args.execute().await,
            Commands::Check(args) => args.execute().await,
        }
    })
}
