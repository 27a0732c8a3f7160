//! The `[analyzer]` table of a policy document.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Excludes applied when the policy configures none.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/target/**",
    "**/vendor/**",
    "**/node_modules/**",
    "**/build/**",
    "**/.git/**",
    "**/__pycache__/**",
];

/// Analyzer-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Root directory to analyze, relative to the policy file's project
    /// (default: `.`).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns (root-relative) to exclude from scanning.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Directories against which absolute module paths resolve, in
    /// priority order. The scan root is always tried last.
    #[serde(default)]
    pub module_roots: Vec<String>,

    /// Directory whose immediate subdirectories each name a context.
    #[serde(default)]
    pub contexts_root: Option<String>,

    /// Whether to respect `.gitignore` files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of candidate files to analyze.
    #[serde(default)]
    pub max_files: Option<usize>,

    /// Wall-clock budget for extraction, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: Vec::new(),
            module_roots: Vec::new(),
            contexts_root: None,
            respect_gitignore: true,
            max_files: None,
            timeout_secs: None,
        }
    }
}

impl AnalyzerConfig {
    /// Extraction timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: AnalyzerConfig = toml::from_str("").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.root, PathBuf::from("."));
        assert!(config.respect_gitignore);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn analyzer_table_fields() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
exclude = ["**/generated/**"]
module_roots = ["src"]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.exclude, vec!["**/generated/**"]);
        assert_eq!(config.module_roots, vec!["src"]);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<AnalyzerConfig, _> = toml::from_str("paralelism = 4\n");
        assert!(result.is_err());
    }
}
