//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::AnalyzerConfig;

/// Raw TOML representation of a policy document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocumentDto {
    /// Scan settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Policy-wide settings.
    #[serde(default)]
    pub policy: PolicySettingsDto,

    /// Context declarations, in declaration order.
    #[serde(default)]
    pub contexts: Vec<ContextDto>,

    /// Allow-lists keyed by source context.
    #[serde(default)]
    pub boundaries: BTreeMap<String, Vec<String>>,

    /// Forbidden dependency patterns keyed by scope (`global` or a context).
    #[serde(default)]
    pub forbidden: BTreeMap<String, Vec<String>>,
}

/// TOML representation of the `[policy]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySettingsDto {
    /// `deny-all` (default) or `allow-all`.
    #[serde(default = "default_policy_str")]
    pub default_policy: String,

    /// Accept references to contexts that are never declared.
    #[serde(default)]
    pub allow_forward_declared: bool,
}

impl Default for PolicySettingsDto {
    fn default() -> Self {
        Self {
            default_policy: default_policy_str(),
            allow_forward_declared: false,
        }
    }
}

/// TOML representation of a `[[contexts]]` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextDto {
    /// Context name (e.g., "payments").
    pub name: String,
    /// Root-relative directory prefixes claimed by this context.
    #[serde(default)]
    pub paths: Vec<String>,
}

fn default_policy_str() -> String {
    "deny-all".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto: PolicyDocumentDto = toml::from_str("").unwrap();
        assert!(dto.contexts.is_empty());
        assert!(dto.boundaries.is_empty());
        assert!(dto.forbidden.is_empty());
        assert_eq!(dto.policy.default_policy, "deny-all");
    }

    #[test]
    fn deserialize_full_document() {
        let toml_str = r#"
[analyzer]
root = "."
module_roots = ["src", "src/domains"]
contexts_root = "src/domains"

[policy]
default_policy = "allow-all"
allow_forward_declared = true

[[contexts]]
name = "shared"
paths = ["src/domains/shared"]

[boundaries]
payments = ["shared"]
shipping = ["shared", "inventory"]

[forbidden]
services = ["sqlalchemy", "boto3"]
global = ["psycopg2"]
"#;
        let dto: PolicyDocumentDto = toml::from_str(toml_str).unwrap();
        assert_eq!(dto.analyzer.module_roots, vec!["src", "src/domains"]);
        assert_eq!(dto.policy.default_policy, "allow-all");
        assert!(dto.policy.allow_forward_declared);
        assert_eq!(dto.contexts.len(), 1);
        assert_eq!(dto.boundaries["shipping"], vec!["shared", "inventory"]);
        assert_eq!(dto.forbidden.len(), 2);
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let result: Result<PolicyDocumentDto, _> = toml::from_str("[boundary]\na = []\n");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let result: Result<PolicyDocumentDto, _> = toml::from_str("[boundaries]\na = \"b\"\n");
        assert!(result.is_err());
    }
}
