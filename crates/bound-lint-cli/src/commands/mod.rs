//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::Result;
use bound_lint_core::{Analyzer, AnalyzerBuilder};

use crate::config_resolver;

pub mod check;
pub mod contexts;
pub mod init;
pub mod output;

/// Resolves the policy and prepares a builder for `path`.
///
/// An explicit path overrides `[analyzer] root`. A global policy has no
/// project of its own, so the current directory is scanned.
fn analyzer_for(path: Option<&Path>, policy: Option<&Path>) -> Result<AnalyzerBuilder> {
    let project_dir = path.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let source = config_resolver::resolve(&project_dir, policy)?;
    if source.is_global() {
        tracing::info!("Using global policy: {}", source.path().display());
    }

    let mut builder = Analyzer::builder().policy_file(source.path());
    if path.is_some() || source.is_global() {
        builder = builder.root(project_dir);
    }
    Ok(builder)
}
