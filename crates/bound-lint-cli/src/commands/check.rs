//! Check command implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::OutputFormat;

/// Arguments of `bound-lint check`.
#[derive(Debug, Default)]
pub struct CheckArgs<'a> {
    /// Root override.
    pub path: Option<PathBuf>,
    /// Explicit policy file.
    pub policy: Option<&'a Path>,
    /// Output format.
    pub format: OutputFormat,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
    /// Candidate file cap.
    pub max_files: Option<usize>,
    /// Extraction budget in seconds.
    pub timeout_secs: Option<u64>,
}

/// Runs the check command and returns the process exit code.
///
/// # Errors
///
/// Returns an error if the policy cannot be resolved or loaded, or the root
/// cannot be scanned.
pub fn run(args: &CheckArgs<'_>) -> Result<u8> {
    let mut builder = super::analyzer_for(args.path.as_deref(), args.policy)?
        .excludes(args.exclude.iter().cloned());
    if let Some(max) = args.max_files {
        builder = builder.max_files(max);
    }
    if let Some(secs) = args.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    let analyzer = builder.build()?;
    tracing::info!("Checking {}", analyzer.root().display());
    let report = analyzer.analyze()?;

    super::output::print(&report, args.format)?;
    Ok(report.exit_code())
}
