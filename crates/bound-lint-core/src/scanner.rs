//! Source discovery: walks the root and yields candidate files by dialect.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Diagnostic;
use tracing::debug;

use crate::extract::Dialect;
use crate::policy::ContextName;
use crate::types::{Warning, WarningKind};
use crate::utils::glob_pattern::{GlobError, GlobPattern};

/// Fatal scan errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ScanError {
    /// The root does not exist.
    #[error("root directory not found: {}", path.display())]
    #[diagnostic(code(bound_lint::scan::root_not_found))]
    RootNotFound {
        /// The missing root.
        path: PathBuf,
    },

    /// The root is not a directory.
    #[error("root is not a directory: {}", path.display())]
    #[diagnostic(code(bound_lint::scan::not_a_directory))]
    NotADirectory {
        /// The offending root.
        path: PathBuf,
    },

    /// An exclusion pattern does not compile.
    #[error("invalid exclude pattern: {0}")]
    #[diagnostic(code(bound_lint::scan::invalid_exclude))]
    InvalidExclude(#[from] GlobError),
}

/// A candidate source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as reached from the root (absolute when the root is).
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
    /// Dialect inferred from the extension.
    pub dialect: Dialect,
    /// Owning context, set by classification.
    pub context: Option<ContextName>,
}

/// Everything one walk produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Candidate files ordered by relative path.
    pub files: Vec<SourceFile>,
    /// Unreadable entries and filesystem loops.
    pub warnings: Vec<Warning>,
    /// True if `max_files` cut the candidate list.
    pub truncated: bool,
}

/// Walks a root directory for candidate files.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    excludes: Arc<Vec<GlobPattern>>,
    respect_gitignore: bool,
}

impl Scanner {
    /// Creates a scanner.
    ///
    /// # Errors
    ///
    /// Returns error if the root is missing or not a directory, or if an
    /// exclusion pattern is invalid.
    pub fn new(
        root: impl Into<PathBuf>,
        exclude: &[String],
        respect_gitignore: bool,
    ) -> Result<Self, ScanError> {
        let root = root.into();
        if !root.exists() {
            return Err(ScanError::RootNotFound { path: root });
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        let excludes = exclude
            .iter()
            .map(|p| GlobPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            root,
            excludes: Arc::new(excludes),
            respect_gitignore,
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walks the root. Each call starts a fresh walk.
    ///
    /// Excluded directories are pruned without being entered. Walk errors
    /// (permissions, symlink loops) come through as [`WarningKind::Scan`]
    /// warnings.
    pub fn files(&self) -> impl Iterator<Item = Result<SourceFile, Warning>> + '_ {
        let root = self.root.clone();
        let excludes = Arc::clone(&self.excludes);

        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .follow_links(true)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .require_git(false)
            .filter_entry(move |entry| {
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                if relative.as_os_str().is_empty() {
                    return true;
                }
                let excluded = is_excluded(&excludes, relative);
                if excluded {
                    debug!("Excluding: {}", relative.display());
                }
                !excluded
            });

        builder.build().filter_map(move |entry| match entry {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    return None;
                }
                let dialect = Dialect::from_path(entry.path())?;
                let relative = entry
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                Some(Ok(SourceFile {
                    path: entry.into_path(),
                    relative,
                    dialect,
                    context: None,
                }))
            }
            Err(err) => Some(Err(self.walk_warning(&err))),
        })
    }

    /// Walks the whole root and returns files ordered by relative path,
    /// capped at `max_files`.
    #[must_use]
    pub fn collect(&self, max_files: Option<usize>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for item in self.files() {
            match item {
                Ok(file) => outcome.files.push(file),
                Err(warning) => {
                    tracing::warn!("{warning}");
                    outcome.warnings.push(warning);
                }
            }
        }

        outcome.files.sort_by(|a, b| a.relative.cmp(&b.relative));
        outcome.warnings.sort();

        if let Some(max) = max_files {
            if outcome.files.len() > max {
                tracing::warn!(
                    "Candidate files capped at {max} (found {})",
                    outcome.files.len()
                );
                outcome.files.truncate(max);
                outcome.truncated = true;
            }
        }
        outcome
    }

    fn walk_warning(&self, err: &ignore::Error) -> Warning {
        let path = error_path(err)
            .map(|p| p.strip_prefix(&self.root).unwrap_or(p).to_path_buf())
            .unwrap_or_default();
        Warning::new(WarningKind::Scan, path, err.to_string())
    }
}

fn is_excluded(excludes: &[GlobPattern], relative: &Path) -> bool {
    excludes.iter().any(|p| p.matches(relative))
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::Loop { child, .. } => Some(child),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relatives(outcome: &ScanOutcome) -> Vec<String> {
        outcome
            .files
            .iter()
            .map(|f| crate::utils::slash_path(&f.relative))
            .collect()
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = Scanner::new("/definitely/not/here", &[], true).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py");
        let err = Scanner::new(dir.path().join("a.py"), &[], true).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn yields_candidates_by_extension_in_path_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/b.py");
        touch(dir.path(), "src/a.ts");
        touch(dir.path(), "README.md");
        touch(dir.path(), "src/lib.rs");

        let scanner = Scanner::new(dir.path(), &[], true).unwrap();
        let outcome = scanner.collect(None);
        assert_eq!(relatives(&outcome), vec!["src/a.ts", "src/b.py", "src/lib.rs"]);
        assert!(!outcome.truncated);
    }

    #[test]
    fn excludes_prune_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/app.py");
        touch(dir.path(), "vendor/lib.py");
        touch(dir.path(), "src/vendor/nested.py");

        let scanner = Scanner::new(dir.path(), &["**/vendor/**".to_string()], true).unwrap();
        assert_eq!(relatives(&scanner.collect(None)), vec!["src/app.py"]);
    }

    #[test]
    fn respects_gitignore_when_asked() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/app.py");
        touch(dir.path(), "generated/out.py");
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();

        let scanner = Scanner::new(dir.path(), &[], true).unwrap();
        assert_eq!(relatives(&scanner.collect(None)), vec!["src/app.py"]);

        let scanner = Scanner::new(dir.path(), &[], false).unwrap();
        assert_eq!(scanner.collect(None).files.len(), 2);
    }

    #[test]
    fn files_is_restartable() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py");
        let scanner = Scanner::new(dir.path(), &[], true).unwrap();
        assert_eq!(scanner.files().count(), 1);
        assert_eq!(scanner.files().count(), 1);
    }

    #[test]
    fn max_files_truncates() {
        let dir = TempDir::new().unwrap();
        for name in ["a.py", "b.py", "c.py"] {
            touch(dir.path(), name);
        }
        let scanner = Scanner::new(dir.path(), &[], true).unwrap();
        let outcome = scanner.collect(Some(2));
        assert_eq!(relatives(&outcome), vec!["a.py", "b.py"]);
        assert!(outcome.truncated);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_become_warnings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "pkg/mod.py");
        std::os::unix::fs::symlink(dir.path().join("pkg"), dir.path().join("pkg/again")).unwrap();

        let scanner = Scanner::new(dir.path(), &[], true).unwrap();
        let outcome = scanner.collect(None);
        assert_eq!(relatives(&outcome), vec!["pkg/mod.py"]);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::Scan));
    }
}
