//! Orchestrates one analysis run.
//!
//! The policy is loaded and validated before any file is touched. Files are
//! then scanned, extracted in parallel on the rayon pool and joined before
//! the single-threaded graph, detection and report phases.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use miette::Diagnostic;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::config::DEFAULT_EXCLUDES;
use crate::detector::detect;
use crate::extract::{extract, Extraction};
use crate::graph::DependencyGraph;
use crate::policy::{load_policy_file, ModelError, Policy, PolicyDocument, PolicyError};
use crate::report::{Report, RunStats};
use crate::scanner::{ScanError, ScanOutcome, Scanner, SourceFile};
use crate::types::{Warning, WarningKind};

/// Errors that abort a run before any result exists.
#[derive(Debug, Error, Diagnostic)]
pub enum AnalyzerError {
    /// The root could not be scanned.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    /// The policy could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),

    /// No policy was given to the builder.
    #[error("no policy configured")]
    #[diagnostic(
        code(bound_lint::analyzer::no_policy),
        help("call `.policy(..)` or `.policy_file(..)` on the builder")
    )]
    NoPolicy,

    /// The contexts root is not a valid prefix.
    #[error("invalid contexts_root: {0}")]
    #[diagnostic(code(bound_lint::analyzer::contexts_root))]
    Classifier(#[source] ModelError),

    /// The working directory could not be determined.
    #[error("cannot resolve the working directory: {0}")]
    #[diagnostic(code(bound_lint::analyzer::io))]
    Io(#[from] std::io::Error),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Debug, Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    document: Option<PolicyDocument>,
    policy_file: Option<PathBuf>,
    exclude_patterns: Vec<String>,
    max_files: Option<usize>,
    timeout: Option<Duration>,
    respect_gitignore: Option<bool>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze, overriding `[analyzer] root`.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Uses an already loaded policy document.
    #[must_use]
    pub fn policy(mut self, document: PolicyDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Loads the policy from a TOML file at build time. A relative
    /// `[analyzer] root` resolves against the file's directory.
    #[must_use]
    pub fn policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_file = Some(path.into());
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Caps the number of candidate files.
    #[must_use]
    pub fn max_files(mut self, max: usize) -> Self {
        self.max_files = Some(max);
        self
    }

    /// Stops scheduling extractions after `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides `[analyzer] respect_gitignore`.
    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = Some(respect);
        self
    }

    /// Builds the analyzer. The policy is loaded and validated here.
    ///
    /// # Errors
    ///
    /// Returns an error if no policy was given, the policy is invalid, or
    /// the root is missing or not a directory.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let (document, base) = match (self.document, self.policy_file) {
            (Some(document), _) => (document, None),
            (None, Some(path)) => {
                let document = load_policy_file(&path)?;
                let base = path.parent().map(Path::to_path_buf);
                (document, base)
            }
            (None, None) => return Err(AnalyzerError::NoPolicy),
        };
        let PolicyDocument { analyzer, policy } = document;

        let root = match self.root {
            Some(root) => root,
            None => match base {
                Some(base) if analyzer.root.is_relative() => base.join(&analyzer.root),
                _ => analyzer.root.clone(),
            },
        };
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        // Merge exclude patterns from config
        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(analyzer.exclude.iter().cloned());
        if exclude_patterns.is_empty() {
            exclude_patterns.extend(DEFAULT_EXCLUDES.iter().map(ToString::to_string));
        }

        let respect_gitignore = self
            .respect_gitignore
            .unwrap_or(analyzer.respect_gitignore);
        let scanner = Scanner::new(root, &exclude_patterns, respect_gitignore)?;
        let classifier = Classifier::new(&policy, analyzer.contexts_root.as_deref())
            .map_err(AnalyzerError::Classifier)?;

        Ok(Analyzer {
            scanner,
            classifier,
            policy,
            max_files: self.max_files.or(analyzer.max_files),
            timeout: self.timeout.or_else(|| analyzer.timeout()),
            module_roots: analyzer.module_roots,
        })
    }
}

/// Runs the scan, extraction, graph and detection phases.
///
/// Use [`Analyzer::builder()`] to construct an instance.
#[derive(Debug)]
pub struct Analyzer {
    scanner: Scanner,
    classifier: Classifier,
    policy: Policy,
    module_roots: Vec<String>,
    max_files: Option<usize>,
    timeout: Option<Duration>,
}

enum FileOutcome {
    Extracted(Extraction),
    Unreadable(Warning),
    Skipped,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    /// The validated policy.
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The path classifier derived from the policy.
    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Scans the root and assigns every candidate file its context.
    #[must_use]
    pub fn classify_files(&self) -> ScanOutcome {
        let mut outcome = self.scanner.collect(self.max_files);
        for file in &mut outcome.files {
            file.context = self.classifier.classify(&file.relative).context().cloned();
            match &file.context {
                Some(context) => debug!("{} -> {context}", file.relative.display()),
                None => debug!("{} -> unassigned", file.relative.display()),
            }
        }
        outcome
    }

    /// Analyzes the tree and returns the report.
    ///
    /// Soft problems (unreadable files, malformed imports, walk errors)
    /// become warnings in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the root vanished since the analyzer was built.
    pub fn analyze(&self) -> Result<Report, AnalyzerError> {
        if !self.root().is_dir() {
            return Err(ScanError::RootNotFound {
                path: self.root().to_path_buf(),
            }
            .into());
        }
        info!("Starting analysis at {}", self.root().display());
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let ScanOutcome {
            files,
            mut warnings,
            truncated: capped,
        } = self.classify_files();
        let files_classified = files.iter().filter(|f| f.context.is_some()).count();
        info!(
            "Found {} candidate files, {} classified",
            files.len(),
            files_classified
        );

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| extract_file(file, deadline))
            .collect();

        let mut facts = Vec::new();
        let mut skipped = 0usize;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Extracted(extraction) => {
                    facts.extend(extraction.facts);
                    warnings.extend(extraction.warnings);
                }
                FileOutcome::Unreadable(warning) => warnings.push(warning),
                FileOutcome::Skipped => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Timeout reached; {skipped} file(s) were not extracted");
        }

        let graph = DependencyGraph::build(
            &files,
            &facts,
            &self.classifier,
            &self.policy,
            &self.module_roots,
        );
        let violations = detect(&graph, &self.policy);

        info!(
            "Analysis complete: {} facts, {} edges, {} violation(s)",
            facts.len(),
            graph.edges().len(),
            violations.len()
        );

        let stats = RunStats {
            files_scanned: files.len(),
            files_classified,
            facts: facts.len(),
            truncated: capped || skipped > 0,
        };
        Ok(Report::new(&self.policy, &graph, violations, warnings, stats))
    }
}

fn extract_file(file: &SourceFile, deadline: Option<Instant>) -> FileOutcome {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return FileOutcome::Skipped;
    }

    debug!("Extracting: {}", file.relative.display());
    match std::fs::read(&file.path) {
        Ok(bytes) => {
            let source = String::from_utf8_lossy(&bytes);
            FileOutcome::Extracted(extract(&file.relative, file.dialect, &source))
        }
        Err(err) => {
            warn!("Failed to read {}: {err}", file.relative.display());
            FileOutcome::Unreadable(Warning::new(
                WarningKind::FileRead,
                file.relative.clone(),
                err.to_string(),
            ))
        }
    }
}
