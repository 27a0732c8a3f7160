//! # bound-lint-core
//!
//! Architectural-boundary enforcement engine.
//!
//! Scans a source tree, extracts import statements per dialect (Python,
//! ECMAScript, JVM languages, Rust), assigns files to bounded contexts and
//! checks the resulting dependency graph against a declarative policy:
//!
//! - [`Scanner`] walks the root and yields candidate files
//! - [`extract()`] turns one file's imports into [`ImportFact`]s
//! - [`Classifier`] maps paths to contexts
//! - [`DependencyGraph`] resolves facts into context-level edges
//! - [`Policy`] holds boundary and forbidden-dependency rules
//! - [`detect`] evaluates edges and [`Report`] renders the outcome
//!
//! ## Example
//!
//! ```ignore
//! use bound_lint_core::{load_policy_file, Analyzer};
//!
//! let analyzer = Analyzer::builder()
//!     .root(".")
//!     .policy(load_policy_file("bound-lint.toml".as_ref())?)
//!     .build()?;
//!
//! let report = analyzer.analyze()?;
//! println!("{}", report.render_text());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod classifier;
mod config;
mod detector;
mod graph;
mod report;
mod scanner;
mod types;

pub mod extract;
pub mod policy;

/// Path and pattern helpers.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use classifier::{Classification, Classifier};
pub use config::{AnalyzerConfig, DEFAULT_EXCLUDES};
pub use detector::{boundary_violations, detect, forbidden_dependencies, reachable_contexts};
pub use extract::{extract, Dialect, ImportFact, ImportForm, ModulePath};
pub use graph::{DependencyEdge, DependencyGraph, EdgeTarget};
pub use policy::{load_policy_file, parse_policy, ContextName, Policy, PolicyDocument, PolicyError};
pub use report::{ContextDependency, ContextSection, Report, RunStats, RunStatus, Summary};
pub use scanner::{ScanError, ScanOutcome, Scanner, SourceFile};
pub use types::{Location, Violation, ViolationKind, Warning, WarningKind};
