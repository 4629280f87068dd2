//! Command-line interface for diff-batcher
//!
//! Provides `plan`, `render` and `collect` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod collect;
mod plan;
mod render;
mod utils;

/// Split a week of commit diffs into day-aligned, token-budgeted batches
#[derive(Parser)]
#[command(name = "diff-batcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tier and batch layout for each repository in an activity file
    Plan(plan::PlanArgs),

    /// Write one payload file per batch plus a plan report
    Render(render::RenderArgs),

    /// Build an activity file from a local git repository's history
    Collect(collect::CollectArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Plan(args) => plan::run(args),
        Commands::Render(args) => render::run(args),
        Commands::Collect(args) => collect::run(args),
    }
}
