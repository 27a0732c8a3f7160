//! Locating the policy file for a CLI run.
//!
//! A `--policy` path wins outright. Otherwise the project directory is
//! searched for `bound-lint.toml` and then `.bound-lint.toml`, and finally
//! the user's config directory (`$BOUND_LINT_CONFIG_DIR`, else
//! `~/.bound-lint`) for `config.toml`. A run without any policy is fatal.

use std::path::{Path, PathBuf};

use bound_lint_core::PolicyError;

/// Origin of the policy used for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    /// Named by `--policy`; existence is left to the loader.
    Explicit(PathBuf),
    /// Sits in the project directory.
    Project(PathBuf),
    /// Per-user fallback policy.
    Global(PathBuf),
}

impl PolicySource {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => p,
        }
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// Policy names recognised in a project directory, most preferred first.
pub const PROJECT_POLICY_NAMES: &[&str] = &["bound-lint.toml", ".bound-lint.toml"];

const GLOBAL_POLICY_NAME: &str = "config.toml";

/// Picks the policy for a run rooted at `project_dir`.
///
/// # Errors
///
/// [`PolicyError::Missing`] with every path that was checked.
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> Result<PolicySource, PolicyError> {
    resolve_in(project_dir, explicit, global_config_dir())
}

/// `resolve` with the user config directory passed in, so tests never touch
/// the process environment.
fn resolve_in(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> Result<PolicySource, PolicyError> {
    if let Some(path) = explicit {
        return Ok(PolicySource::Explicit(path.to_path_buf()));
    }

    let project = PROJECT_POLICY_NAMES
        .iter()
        .map(|name| PolicySource::Project(project_dir.join(name)));
    let global = global_dir.map(|dir| PolicySource::Global(dir.join(GLOBAL_POLICY_NAME)));

    let mut searched = Vec::new();
    for source in project.chain(global) {
        if source.path().is_file() {
            tracing::debug!(
                path = %source.path().display(),
                global = source.is_global(),
                "policy located"
            );
            return Ok(source);
        }
        searched.push(source.path().to_path_buf());
    }

    Err(PolicyError::Missing { searched })
}

/// User-level config directory: `$BOUND_LINT_CONFIG_DIR` when set, else
/// `~/.bound-lint`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os("BOUND_LINT_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".bound-lint")))
}
