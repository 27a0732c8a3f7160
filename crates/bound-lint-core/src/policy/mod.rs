//! Boundary policies driven by TOML configuration.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types
//!   ↓ validate + convert
//! PolicyDocument { AnalyzerConfig, Policy (pure domain model) }
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;

use crate::config::AnalyzerConfig;

pub mod config_dto;
pub mod loader;
pub mod model;

pub use model::{
    AllowList, BoundaryRule, ContextDecl, ContextName, DefaultPolicy, DependencyPattern,
    ForbiddenRule, ForbiddenScope, ModelError, PathPrefix, Policy,
};

/// A loaded policy document: scan settings plus the validated policy.
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    /// The `[analyzer]` table.
    pub analyzer: AnalyzerConfig,
    /// Contexts, boundaries and forbidden rules.
    pub policy: Policy,
}

/// Fatal errors from reading or validating a policy document.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy file {}", path.display())]
    #[diagnostic(code(bound_lint::policy::io))]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// TOML syntax or schema error (unknown keys, wrong types).
    #[error("invalid policy document: {0}")]
    #[diagnostic(
        code(bound_lint::policy::schema),
        help("see `bound-lint init` for a starter policy")
    )]
    Toml(#[from] toml::de::Error),

    /// Domain validation failed.
    #[error("{0}")]
    #[diagnostic(
        code(bound_lint::policy::validation),
        help("declare every referenced context in [[contexts]] or [boundaries], or set `allow_forward_declared = true`")
    )]
    Load(#[from] loader::LoadError),

    /// No policy document could be found.
    #[error("no policy file found (searched: {})", format_paths(searched))]
    #[diagnostic(
        code(bound_lint::policy::missing),
        help("run `bound-lint init` to create bound-lint.toml, or pass --policy")
    )]
    Missing {
        /// Locations that were tried.
        searched: Vec<PathBuf>,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses and validates a policy document from TOML text.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn parse_policy(content: &str) -> Result<PolicyDocument, PolicyError> {
    let dto: config_dto::PolicyDocumentDto = toml::from_str(content)?;
    Ok(loader::load(dto)?)
}

/// Reads, parses and validates a policy file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load_policy_file(path: &Path) -> Result<PolicyDocument, PolicyError> {
    let content = std::fs::read_to_string(path).map_err(|e| PolicyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!("Loaded policy from {}", path.display());
    parse_policy(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_policy() {
        let doc = parse_policy(
            r#"
[[contexts]]
name = "shared"
paths = ["src/shared"]

[boundaries]
payments = ["shared"]
"#,
        )
        .unwrap();
        assert_eq!(doc.policy.declared_contexts().len(), 2);
    }

    #[test]
    fn schema_errors_are_toml_errors() {
        let err = parse_policy("[analyzer]\nroot = 5\n").unwrap_err();
        assert!(matches!(err, PolicyError::Toml(_)));
    }

    #[test]
    fn validation_errors_have_diagnostic_codes() {
        let err = parse_policy("[boundaries]\npayments = [\"ledger\"]\n").unwrap_err();
        assert!(matches!(err, PolicyError::Load(_)));
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("bound_lint::policy::validation"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_policy_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }
}
