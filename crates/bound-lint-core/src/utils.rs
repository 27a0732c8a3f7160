//! Utility functions shared across the engine.

pub mod glob_pattern;
pub mod paths;

#[doc(inline)]
pub use glob_pattern::GlobPattern;
#[doc(inline)]
pub use paths::{dependency_segments, path_segments, slash_path};
