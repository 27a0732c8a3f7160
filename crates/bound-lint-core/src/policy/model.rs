//! Pure domain model for boundary policies.
//!
//! This module contains no serde and no I/O. All invariants are enforced at
//! construction time via validated newtypes; the aggregate root [`Policy`]
//! verifies cross-references.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path};

use crate::utils::paths::{dependency_segments, segments_match, SegmentPattern};

/// Scope key in `[forbidden]` that applies to every context.
pub const GLOBAL_SCOPE: &str = "global";

/// Allow-list entry that permits every context.
pub const WILDCARD: &str = "*";

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

/// A validated context name (non-empty, `[a-z0-9_-]` only, not `global`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextName(String);

impl ContextName {
    /// Creates a new context name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty, contains invalid characters, or
    /// is reserved.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyContextName);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ModelError::InvalidContextName {
                name: name.to_string(),
            });
        }
        if name == GLOBAL_SCOPE {
            return Err(ModelError::ReservedContextName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated root-relative directory prefix (`src/domains/payments`).
///
/// Matching is component-wise, so `src/pay` never claims `src/payments`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPrefix(Vec<String>);

impl PathPrefix {
    /// Creates a new path prefix.
    ///
    /// # Errors
    ///
    /// Returns error if the prefix is empty, absolute, or climbs with `..`.
    pub fn new(prefix: &str) -> Result<Self, ModelError> {
        let path = Path::new(prefix);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(ModelError::InvalidPathPrefix {
                prefix: prefix.to_string(),
            });
        }
        let segments = crate::utils::path_segments(path);
        if segments.is_empty() {
            return Err(ModelError::EmptyPathPrefix);
        }
        Ok(Self(segments))
    }

    /// Returns the prefix segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Tests whether `path` segments start with this prefix.
    #[must_use]
    pub fn claims(&self, path: &[String]) -> bool {
        crate::utils::paths::has_segment_prefix(path, &self.0)
    }
}

impl fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// A validated external-dependency pattern.
///
/// Segments are separated by `.`, `/` or `::`. A segment may contain glob
/// wildcards (`psycopg*`, `*`); `**` spans any number of segments. A bare
/// pattern also matches submodules: `sqlalchemy` matches `sqlalchemy.orm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPattern {
    raw: String,
    segments: Vec<SegmentPattern>,
}

impl DependencyPattern {
    /// Creates a new dependency pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or a segment is not a valid glob.
    pub fn new(pattern: &str) -> Result<Self, ModelError> {
        let parts = dependency_segments(pattern);
        if parts.is_empty() {
            return Err(ModelError::EmptyDependencyPattern);
        }
        let segments = parts
            .iter()
            .map(|part| {
                if part == "**" {
                    Ok(SegmentPattern::AnyDepth)
                } else {
                    glob::Pattern::new(part)
                        .map(SegmentPattern::Glob)
                        .map_err(|e| ModelError::InvalidDependencyPattern {
                            pattern: pattern.to_string(),
                            reason: e.to_string(),
                        })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Tests whether a dependency name (already split into segments) matches.
    #[must_use]
    pub fn matches(&self, name: &[String]) -> bool {
        segments_match(name, &self.segments)
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// ────────────────────────────────────────────
// Domain entities
// ────────────────────────────────────────────

/// A context declared by a `[[contexts]]` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDecl {
    name: ContextName,
    prefixes: Vec<PathPrefix>,
}

impl ContextDecl {
    /// Creates a new context declaration.
    #[must_use]
    pub fn new(name: ContextName, prefixes: Vec<PathPrefix>) -> Self {
        Self { name, prefixes }
    }

    /// Returns the context name.
    #[must_use]
    pub fn name(&self) -> &ContextName {
        &self.name
    }

    /// Returns the classification prefixes in declaration order.
    #[must_use]
    pub fn prefixes(&self) -> &[PathPrefix] {
        &self.prefixes
    }
}

/// Contexts a source context may depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    /// Exactly these contexts (plus the source itself).
    Only(BTreeSet<ContextName>),
    /// Any context (`"*"`).
    Any,
}

impl AllowList {
    /// Tests whether `target` is allowed.
    #[must_use]
    pub fn contains(&self, target: &ContextName) -> bool {
        match self {
            Self::Only(set) => set.contains(target),
            Self::Any => true,
        }
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Only(set) if set.is_empty() => f.write_str("nothing"),
            Self::Only(set) => {
                let names: Vec<&str> = set.iter().map(ContextName::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// A `[boundaries]` entry: what one context may import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRule {
    source: ContextName,
    allowed: AllowList,
}

impl BoundaryRule {
    /// Creates a new boundary rule.
    #[must_use]
    pub fn new(source: ContextName, allowed: AllowList) -> Self {
        Self { source, allowed }
    }

    /// Returns the source context.
    #[must_use]
    pub fn source(&self) -> &ContextName {
        &self.source
    }

    /// Returns the allow-list.
    #[must_use]
    pub fn allowed(&self) -> &AllowList {
        &self.allowed
    }
}

/// Where a forbidden-dependency rule applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForbiddenScope {
    /// Every context.
    Global,
    /// One context.
    Context(ContextName),
}

impl ForbiddenScope {
    /// Tests whether this scope covers `context`.
    #[must_use]
    pub fn covers(&self, context: &ContextName) -> bool {
        match self {
            Self::Global => true,
            Self::Context(name) => name == context,
        }
    }
}

impl fmt::Display for ForbiddenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str(GLOBAL_SCOPE),
            Self::Context(name) => write!(f, "{name}"),
        }
    }
}

/// A `[forbidden]` entry: external libraries banned in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenRule {
    scope: ForbiddenScope,
    patterns: Vec<DependencyPattern>,
}

impl ForbiddenRule {
    /// Creates a new forbidden-dependency rule.
    #[must_use]
    pub fn new(scope: ForbiddenScope, patterns: Vec<DependencyPattern>) -> Self {
        Self { scope, patterns }
    }

    /// Returns the scope.
    #[must_use]
    pub fn scope(&self) -> &ForbiddenScope {
        &self.scope
    }

    /// Returns the patterns in declaration order.
    #[must_use]
    pub fn patterns(&self) -> &[DependencyPattern] {
        &self.patterns
    }

    /// Returns the first pattern matching `name`.
    #[must_use]
    pub fn first_match(&self, name: &[String]) -> Option<&DependencyPattern> {
        self.patterns.iter().find(|p| p.matches(name))
    }
}

/// Treatment of contexts without a `[boundaries]` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Unlisted contexts may depend on nothing outside themselves.
    #[default]
    DenyAll,
    /// Unlisted contexts may depend on anything.
    AllowAll,
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DenyAll => f.write_str("deny-all"),
            Self::AllowAll => f.write_str("allow-all"),
        }
    }
}

// ────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────

/// Validated boundary policy.
///
/// All cross-references are verified at construction time. Immutable once
/// built; the detector only queries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    contexts: Vec<ContextDecl>,
    boundaries: BTreeMap<ContextName, BoundaryRule>,
    forbidden: Vec<ForbiddenRule>,
    default_policy: DefaultPolicy,
    forward_declared: BTreeSet<ContextName>,
}

impl Policy {
    /// Creates a new policy with full validation.
    ///
    /// A context is declared by a `[[contexts]]` block or by being a
    /// `[boundaries]` key. With `allow_forward_declared`, references to
    /// undeclared contexts are accepted and recorded instead of rejected.
    ///
    /// # Errors
    ///
    /// Returns every cross-reference problem found.
    pub fn new(
        contexts: Vec<ContextDecl>,
        boundaries: Vec<BoundaryRule>,
        forbidden: Vec<ForbiddenRule>,
        default_policy: DefaultPolicy,
        allow_forward_declared: bool,
    ) -> Result<Self, Vec<ModelError>> {
        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        for decl in &contexts {
            if !seen.insert(decl.name.clone()) {
                errors.push(ModelError::DuplicateContext {
                    name: decl.name.clone(),
                });
            }
        }

        let declared: BTreeSet<ContextName> = contexts
            .iter()
            .map(|c| c.name.clone())
            .chain(boundaries.iter().map(|b| b.source.clone()))
            .collect();

        let mut forward_declared = BTreeSet::new();
        let mut check = |name: &ContextName, context: String| {
            if declared.contains(name) {
                return;
            }
            if allow_forward_declared {
                forward_declared.insert(name.clone());
            } else {
                errors.push(ModelError::UnknownContext {
                    context,
                    name: name.clone(),
                });
            }
        };

        for rule in &boundaries {
            if let AllowList::Only(targets) = &rule.allowed {
                for target in targets {
                    check(target, format!("boundaries.{}", rule.source));
                }
            }
        }
        for rule in &forbidden {
            if let ForbiddenScope::Context(name) = &rule.scope {
                check(name, "forbidden".to_string());
            }
        }

        if errors.is_empty() {
            Ok(Self {
                contexts,
                boundaries: boundaries
                    .into_iter()
                    .map(|b| (b.source.clone(), b))
                    .collect(),
                forbidden,
                default_policy,
                forward_declared,
            })
        } else {
            Err(errors)
        }
    }

    /// Returns `[[contexts]]` declarations in declaration order.
    #[must_use]
    pub fn contexts(&self) -> &[ContextDecl] {
        &self.contexts
    }

    /// Returns boundary rules keyed by source context.
    #[must_use]
    pub fn boundaries(&self) -> &BTreeMap<ContextName, BoundaryRule> {
        &self.boundaries
    }

    /// Returns forbidden-dependency rules.
    #[must_use]
    pub fn forbidden(&self) -> &[ForbiddenRule] {
        &self.forbidden
    }

    /// Returns the default policy for contexts without a boundary rule.
    #[must_use]
    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    /// Contexts referenced but never declared (only with forward
    /// declaration enabled).
    #[must_use]
    pub fn forward_declared(&self) -> &BTreeSet<ContextName> {
        &self.forward_declared
    }

    /// Every declared context: `[[contexts]]` names and `[boundaries]` keys.
    #[must_use]
    pub fn declared_contexts(&self) -> BTreeSet<&ContextName> {
        self.contexts
            .iter()
            .map(ContextDecl::name)
            .chain(self.boundaries.keys())
            .collect()
    }

    /// Looks up a declared or forward-declared context by name.
    #[must_use]
    pub fn context_named(&self, name: &str) -> Option<&ContextName> {
        self.declared_contexts()
            .into_iter()
            .chain(self.forward_declared.iter())
            .find(|c| c.as_str() == name)
    }

    /// Tests whether `source` may depend on `target`. A context may always
    /// depend on itself.
    #[must_use]
    pub fn allows(&self, source: &ContextName, target: &ContextName) -> bool {
        if source == target {
            return true;
        }
        match self.boundaries.get(source) {
            Some(rule) => rule.allowed.contains(target),
            None => self.default_policy == DefaultPolicy::AllowAll,
        }
    }

    /// Renders what `source` is allowed to depend on, for messages.
    #[must_use]
    pub fn describe_allowed(&self, source: &ContextName) -> String {
        match self.boundaries.get(source) {
            Some(rule) => rule.allowed.to_string(),
            None => format!("default {}", self.default_policy),
        }
    }

    /// Forbidden rules whose scope covers `context`, global first.
    pub fn forbidden_for<'a>(
        &'a self,
        context: &'a ContextName,
    ) -> impl Iterator<Item = &'a ForbiddenRule> + 'a {
        self.forbidden.iter().filter(move |r| r.scope.covers(context))
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in domain model construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Context name is empty.
    #[error("context name must not be empty")]
    EmptyContextName,

    /// Context name contains invalid characters.
    #[error("invalid context name `{name}`: must be [a-z0-9_-]")]
    InvalidContextName {
        /// The invalid name.
        name: String,
    },

    /// Context name collides with a reserved word.
    #[error("`{name}` is reserved and cannot name a context")]
    ReservedContextName {
        /// The reserved name.
        name: String,
    },

    /// Path prefix is empty.
    #[error("path prefix must not be empty")]
    EmptyPathPrefix,

    /// Path prefix is absolute or leaves the root.
    #[error("invalid path prefix `{prefix}`: must be relative to the root without `..`")]
    InvalidPathPrefix {
        /// The invalid prefix.
        prefix: String,
    },

    /// Dependency pattern is empty.
    #[error("dependency pattern must not be empty")]
    EmptyDependencyPattern,

    /// Dependency pattern has invalid glob syntax.
    #[error("invalid dependency pattern `{pattern}`: {reason}")]
    InvalidDependencyPattern {
        /// The invalid pattern.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },

    /// The same context has two `[[contexts]]` blocks.
    #[error("context `{name}` is declared more than once")]
    DuplicateContext {
        /// The duplicated name.
        name: ContextName,
    },

    /// A reference points to an undeclared context.
    #[error("{context}: unknown context `{name}`")]
    UnknownContext {
        /// Where the reference was found.
        context: String,
        /// The undeclared context name.
        name: ContextName,
    },
}

// ────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ContextName {
        ContextName::new(s).unwrap()
    }

    fn only(names: &[&str]) -> AllowList {
        AllowList::Only(names.iter().map(|n| name(n)).collect())
    }

    fn decl(n: &str, prefix: &str) -> ContextDecl {
        ContextDecl::new(name(n), vec![PathPrefix::new(prefix).unwrap()])
    }

    fn marketplace() -> Policy {
        Policy::new(
            vec![decl("shared", "src/domains/shared")],
            vec![
                BoundaryRule::new(name("payments"), only(&["shared"])),
                BoundaryRule::new(name("inventory"), only(&["shared"])),
                BoundaryRule::new(name("shipping"), only(&["shared", "inventory"])),
            ],
            vec![],
            DefaultPolicy::DenyAll,
            false,
        )
        .unwrap()
    }

    // -- Newtypes --

    #[test]
    fn context_name_validation() {
        assert!(ContextName::new("payments").is_ok());
        assert!(ContextName::new("order_mgmt-2").is_ok());
        assert_eq!(ContextName::new(""), Err(ModelError::EmptyContextName));
        assert!(matches!(
            ContextName::new("Payments"),
            Err(ModelError::InvalidContextName { .. })
        ));
        assert!(matches!(
            ContextName::new("*"),
            Err(ModelError::InvalidContextName { .. })
        ));
        assert!(matches!(
            ContextName::new("global"),
            Err(ModelError::ReservedContextName { .. })
        ));
    }

    #[test]
    fn path_prefix_validation() {
        let prefix = PathPrefix::new("./src/domains/payments/").unwrap();
        assert_eq!(prefix.to_string(), "src/domains/payments");
        assert_eq!(PathPrefix::new("."), Err(ModelError::EmptyPathPrefix));
        assert!(matches!(
            PathPrefix::new("../elsewhere"),
            Err(ModelError::InvalidPathPrefix { .. })
        ));
        assert!(matches!(
            PathPrefix::new("/abs"),
            Err(ModelError::InvalidPathPrefix { .. })
        ));
    }

    #[test]
    fn path_prefix_claims_on_component_boundary() {
        let prefix = PathPrefix::new("src/pay").unwrap();
        let segments = |s: &str| s.split('/').map(str::to_string).collect::<Vec<_>>();
        assert!(prefix.claims(&segments("src/pay/api.py")));
        assert!(!prefix.claims(&segments("src/payments/api.py")));
    }

    #[test]
    fn dependency_pattern_matching() {
        let segments = crate::utils::paths::dependency_segments;
        let p = DependencyPattern::new("sqlalchemy").unwrap();
        assert!(p.matches(&segments("sqlalchemy.orm")));
        assert!(!p.matches(&segments("sqlalchemy_utils")));

        let p = DependencyPattern::new("psycopg*").unwrap();
        assert!(p.matches(&segments("psycopg2.extras")));

        assert_eq!(
            DependencyPattern::new(""),
            Err(ModelError::EmptyDependencyPattern)
        );
        assert!(matches!(
            DependencyPattern::new("boto[3"),
            Err(ModelError::InvalidDependencyPattern { .. })
        ));
    }

    // -- Aggregate --

    #[test]
    fn allow_list_semantics() {
        let policy = marketplace();
        assert!(policy.allows(&name("shipping"), &name("inventory")));
        assert!(!policy.allows(&name("payments"), &name("inventory")));
        assert!(policy.allows(&name("payments"), &name("payments")));
        assert!(policy.allows(&name("payments"), &name("shared")));
    }

    #[test]
    fn unlisted_context_follows_default_policy() {
        let policy = marketplace();
        assert!(!policy.allows(&name("shared"), &name("payments")));
        assert_eq!(policy.describe_allowed(&name("shared")), "default deny-all");

        let open = Policy::new(vec![], vec![], vec![], DefaultPolicy::AllowAll, false).unwrap();
        assert!(open.allows(&name("a"), &name("b")));
    }

    #[test]
    fn empty_allow_list_denies_everything_but_self() {
        let policy = Policy::new(
            vec![decl("core", "src/core"), decl("web", "src/web")],
            vec![BoundaryRule::new(name("core"), only(&[]))],
            vec![],
            DefaultPolicy::AllowAll,
            false,
        )
        .unwrap();
        assert!(!policy.allows(&name("core"), &name("web")));
        assert!(policy.allows(&name("core"), &name("core")));
        assert_eq!(policy.describe_allowed(&name("core")), "nothing");
    }

    #[test]
    fn wildcard_allows_any_context() {
        let policy = Policy::new(
            vec![],
            vec![BoundaryRule::new(name("app"), AllowList::Any)],
            vec![],
            DefaultPolicy::DenyAll,
            false,
        )
        .unwrap();
        assert!(policy.allows(&name("app"), &name("anything")));
    }

    #[test]
    fn unknown_references_are_all_collected() {
        let errors = Policy::new(
            vec![],
            vec![BoundaryRule::new(name("payments"), only(&["ledger", "fx"]))],
            vec![ForbiddenRule::new(
                ForbiddenScope::Context(name("reports")),
                vec![DependencyPattern::new("boto3").unwrap()],
            )],
            DefaultPolicy::DenyAll,
            false,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ModelError::UnknownContext { .. })));
    }

    #[test]
    fn forward_declared_references_are_recorded() {
        let policy = Policy::new(
            vec![],
            vec![BoundaryRule::new(name("payments"), only(&["ledger"]))],
            vec![],
            DefaultPolicy::DenyAll,
            true,
        )
        .unwrap();
        assert!(policy.forward_declared().contains(&name("ledger")));
        assert!(policy.allows(&name("payments"), &name("ledger")));
        assert_eq!(policy.context_named("ledger"), Some(&name("ledger")));
    }

    #[test]
    fn duplicate_context_blocks_are_rejected() {
        let errors = Policy::new(
            vec![decl("shared", "src/shared"), decl("shared", "lib/shared")],
            vec![],
            vec![],
            DefaultPolicy::DenyAll,
            false,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ModelError::DuplicateContext {
                name: name("shared")
            }]
        );
    }

    #[test]
    fn forbidden_for_includes_global_rules() {
        let policy = Policy::new(
            vec![decl("services", "services")],
            vec![],
            vec![
                ForbiddenRule::new(
                    ForbiddenScope::Global,
                    vec![DependencyPattern::new("psycopg2").unwrap()],
                ),
                ForbiddenRule::new(
                    ForbiddenScope::Context(name("services")),
                    vec![DependencyPattern::new("boto3").unwrap()],
                ),
            ],
            DefaultPolicy::DenyAll,
            false,
        )
        .unwrap();
        assert_eq!(policy.forbidden_for(&name("services")).count(), 2);
        assert_eq!(policy.forbidden_for(&name("web")).count(), 1);
    }
}
