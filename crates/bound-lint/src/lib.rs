//! # bound-lint
//!
//! Bounded-context boundary enforcement for polyglot codebases.
//!
//! This is the facade crate that re-exports the engine and the `check!`
//! macro.
//!
//! ## Quick Start: `cargo test` Integration
//!
//! ```toml
//! [dev-dependencies]
//! bound-lint = "0.1"
//! ```
//!
//! ```rust,ignore
//! // tests/architecture.rs
//! bound_lint::check!();
//! ```
//!
//! This runs bound-lint as part of `cargo test` with the policy in
//! `bound-lint.toml`. The test fails with the full text report when a
//! context crosses a boundary it was not granted.
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use bound_lint::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .policy_file("bound-lint.toml")
//!     .build()?;
//!
//! let report = analyzer.analyze()?;
//! println!("{}", report.render_text());
//! ```

#![forbid(unsafe_code)]

// Re-export the engine
pub use bound_lint_core::*;

// Re-export the check macro for bound_lint::check!()
pub use bound_lint_macros::check;

mod runner;

#[doc(hidden)]
pub mod __internal {
    pub use crate::runner::run_check;
}
