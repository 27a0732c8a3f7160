//! Shared output formatting for reports.

use anyhow::Result;
use bound_lint_core::{Report, RunStatus};

use crate::OutputFormat;

/// Print a report in the specified format.
///
/// Text goes to stdout in full. JSON and compact output keep stdout
/// machine-readable and put the verdict on stderr.
pub fn print(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
            eprintln!("{}", report.status_line());
        }
        OutputFormat::Compact => {
            print!("{}", report.render_compact());
            eprintln!("{}", report.status_line());
        }
    }
    Ok(())
}

fn print_text(report: &Report) {
    let color = match report.status() {
        RunStatus::Pass => "\x1b[32m",
        RunStatus::Fail => "\x1b[31m",
        RunStatus::Truncated => "\x1b[33m",
    };

    let text = report.render_text();
    let mut lines = text.lines();
    if let Some(first) = lines.next() {
        println!("{color}{first}\x1b[0m");
    }
    for line in lines {
        println!("{line}");
    }
}
