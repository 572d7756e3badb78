//! stencil: render parameterized templates and reconcile them into a store.
//!
//! # Usage
//!
//! ```text
//! stencil render <template> --namespace <ns> [--set key=value ...]
//! stencil apply [--template <name> | --params <namespace>/<name>] [--dry-run]
//! stencil diff [--template <name>]
//!
//! Global: --root <dir> (default .)  --store <dir> (default <root>/store)  --verbose
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, diff::DiffArgs, render::RenderArgs, GlobalArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Render parameterized object templates and reconcile them into a store",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template's objects to stdout without touching the store.
    Render(RenderArgs),

    /// Create or update every object affected by a template or parameter record.
    Apply(ApplyArgs),

    /// Show unified diffs of what apply would write.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logs go to stderr; stdout carries rendered output only.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.command {
        Commands::Render(args) => args.run(&cli.global),
        Commands::Apply(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
    }
}
