//! bound-lint CLI tool.
//!
//! Usage:
//! ```bash
//! bound-lint check [OPTIONS] [PATH]
//! bound-lint contexts [PATH]
//! bound-lint init
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bound_lint_core::{AnalyzerError, PolicyError, ScanError};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Exit code for fatal errors (scan, policy).
const EXIT_FATAL: u8 = 2;

/// Bounded-context boundary enforcement for polyglot codebases
#[derive(Parser)]
#[command(name = "bound-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the policy file
    #[arg(short, long, global = true, env = "BOUND_LINT_POLICY")]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the tree against the policy
    Check {
        /// Path to analyze (default: the policy's `[analyzer] root`)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Maximum number of candidate files
        #[arg(long)]
        max_files: Option<usize>,

        /// Stop extracting new files after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show contexts, their rules and member counts
    Contexts {
        /// Path to analyze (default: the policy's `[analyzer] root`)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a starter bound-lint.toml
    Init {
        /// Overwrite an existing policy
        #[arg(long)]
        force: bool,
    },
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report_fatal(err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    let policy = cli.policy.as_deref();
    match cli.command {
        Commands::Check {
            path,
            format,
            exclude,
            max_files,
            timeout_secs,
        } => commands::check::run(&commands::check::CheckArgs {
            path,
            policy,
            format,
            exclude,
            max_files,
            timeout_secs,
        }),
        Commands::Contexts { path, format } => {
            commands::contexts::run(path.as_deref(), policy, format)?;
            Ok(0)
        }
        Commands::Init { force } => {
            commands::init::run(&std::env::current_dir()?, force)?;
            Ok(0)
        }
    }
}

/// Renders engine errors as miette diagnostics; anything else plainly.
fn report_fatal(err: anyhow::Error) {
    let err = match err.downcast::<AnalyzerError>() {
        Ok(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return;
        }
        Err(err) => err,
    };
    let err = match err.downcast::<PolicyError>() {
        Ok(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return;
        }
        Err(err) => err,
    };
    match err.downcast::<ScanError>() {
        Ok(e) => eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => eprintln!("Error: {err:#}"),
    }
}
