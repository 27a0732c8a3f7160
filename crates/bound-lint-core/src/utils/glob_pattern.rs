//! Compiled glob patterns for root-relative file paths.

use std::path::Path;

use super::paths::{path_segments, slash_path};

/// Errors from compiling a [`GlobPattern`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlobError {
    /// Pattern is empty.
    #[error("glob pattern must not be empty")]
    Empty,

    /// Pattern has invalid glob syntax.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    Invalid {
        /// The invalid pattern.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },
}

/// A validated glob pattern for root-relative path matching.
///
/// Compiled once at construction. Besides the literal pattern, a leading
/// `**/` also matches at the root and a trailing `/**` also matches the
/// directory itself, so `**/vendor/**` excludes both `vendor` and
/// `lib/vendor/x.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    file_patterns: Vec<glob::Pattern>,
    dir_patterns: Vec<glob::Pattern>,
}

impl GlobPattern {
    /// Creates a new glob pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or has invalid glob syntax.
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        if pattern.is_empty() {
            return Err(GlobError::Empty);
        }
        let compile = |p: &str| {
            glob::Pattern::new(p).map_err(|e| GlobError::Invalid {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };

        let mut file_variants = vec![pattern];
        if let Some(rest) = pattern.strip_prefix("**/") {
            file_variants.push(rest);
        }

        let mut dir_variants = Vec::new();
        for variant in &file_variants {
            if let Some(dir) = variant.strip_suffix("/**") {
                if !dir.is_empty() {
                    dir_variants.push(dir);
                }
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            file_patterns: file_variants
                .into_iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
            dir_patterns: dir_variants
                .into_iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Tests whether a root-relative path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = slash_path(path);
        if self.file_patterns.iter().any(|p| p.matches(&path_str)) {
            return true;
        }
        if self.dir_patterns.is_empty() {
            return false;
        }

        // `dir/**` claims everything beneath any ancestor matching `dir`.
        let segments = path_segments(path);
        (1..=segments.len()).any(|n| {
            let ancestor = segments[..n].join("/");
            self.dir_patterns.iter().any(|p| p.matches(&ancestor))
        })
    }

    /// Returns the pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
