//! DTO → Domain model conversion with validation.

use std::collections::BTreeSet;

use crate::utils::glob_pattern::{GlobError, GlobPattern};

use super::config_dto::{ContextDto, PolicyDocumentDto, PolicySettingsDto};
use super::model::{
    AllowList, BoundaryRule, ContextDecl, ContextName, DefaultPolicy, DependencyPattern,
    ForbiddenRule, ForbiddenScope, ModelError, PathPrefix, Policy, GLOBAL_SCOPE, WILDCARD,
};
use super::PolicyDocument;

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "contexts[0].name").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// An exclusion glob does not compile.
    #[error("{context}: {source}")]
    Exclude {
        /// Where the error occurred (e.g., "analyzer.exclude[1]").
        context: String,
        /// The underlying glob error.
        source: GlobError,
    },

    /// Unknown `default_policy` string.
    #[error("policy.default_policy: unknown value `{value}`, expected: deny-all, allow-all")]
    UnknownDefaultPolicy {
        /// The invalid value.
        value: String,
    },

    /// Cross-reference errors from aggregate root construction.
    #[error("policy validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a `PolicyDocumentDto` to a validated [`PolicyDocument`].
///
/// # Errors
///
/// Returns the first field-level error, or every cross-reference error at
/// once.
pub fn load(dto: PolicyDocumentDto) -> Result<PolicyDocument, LoadError> {
    validate_analyzer(&dto)?;

    let contexts = dto
        .contexts
        .iter()
        .enumerate()
        .map(|(i, c)| convert_context(c, i))
        .collect::<Result<Vec<_>, _>>()?;

    let boundaries = dto
        .boundaries
        .iter()
        .map(|(source, allowed)| convert_boundary(source, allowed))
        .collect::<Result<Vec<_>, _>>()?;

    let mut forbidden = dto
        .forbidden
        .iter()
        .map(|(scope, patterns)| convert_forbidden(scope, patterns))
        .collect::<Result<Vec<_>, _>>()?;
    forbidden.sort_by(|a, b| a.scope().cmp(b.scope()));

    let default_policy = parse_default_policy(&dto.policy)?;

    let policy = Policy::new(
        contexts,
        boundaries,
        forbidden,
        default_policy,
        dto.policy.allow_forward_declared,
    )
    .map_err(LoadError::CrossRef)?;

    Ok(PolicyDocument {
        analyzer: dto.analyzer,
        policy,
    })
}

fn validate_analyzer(dto: &PolicyDocumentDto) -> Result<(), LoadError> {
    for (i, pattern) in dto.analyzer.exclude.iter().enumerate() {
        GlobPattern::new(pattern).map_err(|e| LoadError::Exclude {
            context: format!("analyzer.exclude[{i}]"),
            source: e,
        })?;
    }
    for (i, root) in dto.analyzer.module_roots.iter().enumerate() {
        // The scan root itself is always a module root.
        if root == "." {
            continue;
        }
        PathPrefix::new(root).map_err(|e| LoadError::Validation {
            context: format!("analyzer.module_roots[{i}]"),
            source: e,
        })?;
    }
    if let Some(root) = &dto.analyzer.contexts_root {
        PathPrefix::new(root).map_err(|e| LoadError::Validation {
            context: "analyzer.contexts_root".to_string(),
            source: e,
        })?;
    }
    Ok(())
}

fn convert_context(dto: &ContextDto, index: usize) -> Result<ContextDecl, LoadError> {
    let ctx = format!("contexts[{index}]");
    let name = ContextName::new(&dto.name).map_err(|e| LoadError::Validation {
        context: format!("{ctx}.name"),
        source: e,
    })?;

    let prefixes = dto
        .paths
        .iter()
        .enumerate()
        .map(|(j, p)| {
            PathPrefix::new(p).map_err(|e| LoadError::Validation {
                context: format!("{ctx}.paths[{j}]"),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContextDecl::new(name, prefixes))
}

fn convert_boundary(source: &str, allowed: &[String]) -> Result<BoundaryRule, LoadError> {
    let source_name = ContextName::new(source).map_err(|e| LoadError::Validation {
        context: format!("boundaries.{source}"),
        source: e,
    })?;

    if allowed.iter().any(|a| a == WILDCARD) {
        return Ok(BoundaryRule::new(source_name, AllowList::Any));
    }

    let targets = allowed
        .iter()
        .enumerate()
        .map(|(i, target)| {
            ContextName::new(target).map_err(|e| LoadError::Validation {
                context: format!("boundaries.{source}[{i}]"),
                source: e,
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(BoundaryRule::new(source_name, AllowList::Only(targets)))
}

fn convert_forbidden(scope: &str, patterns: &[String]) -> Result<ForbiddenRule, LoadError> {
    let scope_ref = if scope == GLOBAL_SCOPE {
        ForbiddenScope::Global
    } else {
        ForbiddenScope::Context(ContextName::new(scope).map_err(|e| LoadError::Validation {
            context: format!("forbidden.{scope}"),
            source: e,
        })?)
    };

    let compiled = patterns
        .iter()
        .enumerate()
        .map(|(i, p)| {
            DependencyPattern::new(p).map_err(|e| LoadError::Validation {
                context: format!("forbidden.{scope}[{i}]"),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForbiddenRule::new(scope_ref, compiled))
}

fn parse_default_policy(settings: &PolicySettingsDto) -> Result<DefaultPolicy, LoadError> {
    match settings.default_policy.as_str() {
        "deny-all" => Ok(DefaultPolicy::DenyAll),
        "allow-all" => Ok(DefaultPolicy::AllowAll),
        other => Err(LoadError::UnknownDefaultPolicy {
            value: other.to_string(),
        }),
    }
}
