//! Maps root-relative paths to contexts.

use std::path::Path;

use crate::policy::{ContextName, ModelError, PathPrefix, Policy};
use crate::utils::paths::path_segments;

/// Result of classifying a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Claimed by a context.
    Context(ContextName),
    /// No rule claims the path.
    Unclassified,
}

impl Classification {
    /// Returns the context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&ContextName> {
        match self {
            Self::Context(name) => Some(name),
            Self::Unclassified => None,
        }
    }
}

/// Ordered path-prefix rules; the first matching rule wins.
///
/// Explicit `[[contexts]]` prefixes come first, in declaration order. An
/// optional contexts root follows: the first directory beneath it names the
/// context (`src/domains/payments/api.py` → `payments`).
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(PathPrefix, ContextName)>,
    contexts_root: Option<PathPrefix>,
}

impl Classifier {
    /// Builds a classifier from the policy's context declarations.
    ///
    /// # Errors
    ///
    /// Returns error if `contexts_root` is not a valid relative prefix.
    pub fn new(policy: &Policy, contexts_root: Option<&str>) -> Result<Self, ModelError> {
        let rules = policy
            .contexts()
            .iter()
            .flat_map(|decl| {
                decl.prefixes()
                    .iter()
                    .map(move |prefix| (prefix.clone(), decl.name().clone()))
            })
            .collect();
        let contexts_root = contexts_root.map(PathPrefix::new).transpose()?;
        Ok(Self {
            rules,
            contexts_root,
        })
    }

    /// Explicit prefix rules in match order.
    #[must_use]
    pub fn rules(&self) -> &[(PathPrefix, ContextName)] {
        &self.rules
    }

    /// The contexts root, if configured.
    #[must_use]
    pub fn contexts_root(&self) -> Option<&PathPrefix> {
        self.contexts_root.as_ref()
    }

    /// Classifies a root-relative file path.
    ///
    /// Under the contexts root only files inside a subdirectory belong to a
    /// context; files directly in the root stay unclassified.
    #[must_use]
    pub fn classify(&self, file: &Path) -> Classification {
        self.classify_segments(&path_segments(file), true)
    }

    /// Classifies a root-relative directory or module path.
    #[must_use]
    pub fn classify_dir(&self, segments: &[String]) -> Classification {
        self.classify_segments(segments, false)
    }

    fn classify_segments(&self, segments: &[String], is_file: bool) -> Classification {
        if let Some((_, name)) = self.rules.iter().find(|(prefix, _)| prefix.claims(segments)) {
            return Classification::Context(name.clone());
        }

        if let Some(root) = &self.contexts_root {
            let depth = root.segments().len();
            let needed = if is_file { depth + 2 } else { depth + 1 };
            if root.claims(segments) && segments.len() >= needed {
                if let Ok(name) = ContextName::new(&segments[depth]) {
                    return Classification::Context(name);
                }
            }
        }

        Classification::Unclassified
    }
}
