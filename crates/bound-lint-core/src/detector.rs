//! Evaluates dependency edges against a policy.
//!
//! Two independent passes over the edge list. Neither short-circuits and
//! `Unassigned` edges are never evaluated.

use crate::graph::{DependencyEdge, DependencyGraph, EdgeTarget};
use crate::policy::{ContextName, DependencyPattern, ForbiddenRule, Policy};
use crate::types::{Location, Violation, ViolationKind};

/// Runs both passes and returns violations in file, line, statement, kind
/// order.
#[must_use]
pub fn detect(graph: &DependencyGraph, policy: &Policy) -> Vec<Violation> {
    let mut violations = boundary_violations(graph.edges(), policy);
    violations.extend(forbidden_dependencies(graph.edges(), policy));
    violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    tracing::debug!("Detected {} violation(s)", violations.len());
    violations
}

// ────────────────────────────────────────────
// Context boundary pass
// ────────────────────────────────────────────

/// Emits a violation for every edge into a context outside the source's
/// allow-list.
#[must_use]
pub fn boundary_violations(edges: &[DependencyEdge], policy: &Policy) -> Vec<Violation> {
    edges
        .iter()
        .filter_map(|edge| {
            let EdgeTarget::Context(target) = &edge.target else {
                return None;
            };
            if policy.allows(&edge.source, target) {
                return None;
            }
            let allowed = policy.describe_allowed(&edge.source);
            Some(Violation::new(
                ViolationKind::BoundaryViolation,
                edge.source.as_str(),
                location(edge),
                target.as_str(),
                format!("{} may depend on: {allowed}", edge.source),
                format!(
                    "`{}` may not depend on `{target}` (allowed: {allowed})",
                    edge.source
                ),
            ))
        })
        .collect()
}

// ────────────────────────────────────────────
// Forbidden-dependency pass
// ────────────────────────────────────────────

/// Emits one violation per forbidden rule whose scope covers the source and
/// whose patterns match an external target.
#[must_use]
pub fn forbidden_dependencies(edges: &[DependencyEdge], policy: &Policy) -> Vec<Violation> {
    let mut violations = Vec::new();
    for edge in edges {
        let EdgeTarget::External { module, members } = &edge.target else {
            continue;
        };

        let mut names = vec![module.segments().to_vec()];
        names.extend(members.iter().map(|m| module.join(m).segments().to_vec()));

        let target = if module.is_empty() {
            edge.raw.clone()
        } else {
            module.to_string()
        };

        for rule in policy.forbidden_for(&edge.source) {
            if let Some(pattern) = matching_pattern(rule, &names) {
                violations.push(forbidden_violation(edge, rule, pattern, &target));
            }
        }
    }
    violations
}

fn matching_pattern<'a>(
    rule: &'a ForbiddenRule,
    names: &[Vec<String>],
) -> Option<&'a DependencyPattern> {
    rule.patterns()
        .iter()
        .find(|pattern| names.iter().any(|name| pattern.matches(name)))
}

fn forbidden_violation(
    edge: &DependencyEdge,
    rule: &ForbiddenRule,
    pattern: &DependencyPattern,
    target: &str,
) -> Violation {
    Violation::new(
        ViolationKind::ForbiddenDependency,
        edge.source.as_str(),
        location(edge),
        target,
        format!("forbidden in {}: {}", rule.scope(), pattern.as_str()),
        format!(
            "`{}` may not import `{target}` (forbidden in {} by `{}`)",
            edge.source,
            rule.scope(),
            pattern.as_str()
        ),
    )
}

fn location(edge: &DependencyEdge) -> Location {
    Location::new(edge.file.clone(), edge.line, edge.statement)
}

/// Named contexts `source` may depend on under the policy, excluding itself,
/// sorted by name.
#[must_use]
pub fn reachable_contexts<'a>(policy: &'a Policy, source: &ContextName) -> Vec<&'a ContextName> {
    let mut reachable: Vec<_> = policy
        .declared_contexts()
        .into_iter()
        .chain(policy.forward_declared())
        .filter(|target| *target != source && policy.allows(source, target))
        .collect();
    reachable.sort();
    reachable.dedup();
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ModulePath;
    use crate::policy::parse_policy;
    use std::path::PathBuf;

    const POLICY: &str = r#"
[boundaries]
payments = ["shared"]
inventory = ["shared"]
shipping = ["shared", "inventory"]
services = []
shared = []
api = ["*"]

[forbidden]
services = ["sqlalchemy", "boto3"]
global = ["psycopg2", "lodash/*"]
"#;

    fn policy() -> Policy {
        parse_policy(POLICY).unwrap().policy
    }

    fn name(s: &str) -> ContextName {
        ContextName::new(s).unwrap()
    }

    fn module(s: &str) -> ModulePath {
        s.split('.').map(str::to_string).collect()
    }

    fn edge(source: &str, target: EdgeTarget, line: usize) -> DependencyEdge {
        DependencyEdge {
            source: name(source),
            target,
            file: PathBuf::from(format!("src/{source}/mod.py")),
            line,
            statement: line - 1,
            raw: String::new(),
        }
    }

    fn external(source: &str, m: &str, line: usize) -> DependencyEdge {
        let mut e = edge(
            source,
            EdgeTarget::External {
                module: module(m),
                members: Vec::new(),
            },
            line,
        );
        e.raw = m.to_string();
        e
    }

    fn ctx(source: &str, target: &str, line: usize) -> DependencyEdge {
        edge(source, EdgeTarget::Context(name(target)), line)
    }

    #[test]
    fn edge_outside_allow_list_is_a_violation() {
        let v = boundary_violations(&[ctx("payments", "inventory", 3)], &policy());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ViolationKind::BoundaryViolation);
        assert_eq!(v[0].target, "inventory");
        assert_eq!(
            v[0].message,
            "`payments` may not depend on `inventory` (allowed: shared)"
        );
    }

    #[test]
    fn allowed_and_self_edges_pass() {
        let edges = [
            ctx("shipping", "inventory", 1),
            ctx("payments", "shared", 2),
            ctx("payments", "payments", 3),
            ctx("api", "inventory", 4),
        ];
        assert!(boundary_violations(&edges, &policy()).is_empty());
    }

    #[test]
    fn empty_allow_list_denies_everything_else() {
        let v = boundary_violations(&[ctx("shared", "payments", 1)], &policy());
        assert_eq!(v[0].rule, "shared may depend on: nothing");
    }

    #[test]
    fn contexts_without_rules_follow_default_policy() {
        let edges = [ctx("reports", "payments", 1)];
        let v = boundary_violations(&edges, &policy());
        assert!(v[0].message.contains("default deny-all"));

        let allow_all = parse_policy("[policy]\ndefault_policy = \"allow-all\"\n")
            .unwrap()
            .policy;
        assert!(boundary_violations(&edges, &allow_all).is_empty());
    }

    #[test]
    fn unassigned_edges_are_never_evaluated() {
        let edges = [edge("payments", EdgeTarget::Unassigned(PathBuf::from("src/util")), 1)];
        let p = policy();
        assert!(boundary_violations(&edges, &p).is_empty());
        assert!(forbidden_dependencies(&edges, &p).is_empty());
    }

    #[test]
    fn forbidden_externals_by_scope() {
        let edges = [
            external("services", "boto3", 1),
            external("services", "sqlalchemy.orm", 2),
            external("payments", "boto3", 3),
            external("services", "requests", 4),
        ];
        let v = forbidden_dependencies(&edges, &policy());
        let targets: Vec<&str> = v.iter().map(|v| v.target.as_str()).collect();
        assert_eq!(targets, vec!["boto3", "sqlalchemy.orm"]);
        assert_eq!(v[1].rule, "forbidden in services: sqlalchemy");
    }

    #[test]
    fn one_violation_per_matching_scope() {
        let policy = parse_policy(
            r#"
[boundaries]
services = []

[forbidden]
global = ["psycopg2"]
services = ["psycopg*", "psycopg2"]
"#,
        )
        .unwrap()
        .policy;
        let v = forbidden_dependencies(&[external("services", "psycopg2.extras", 1)], &policy);
        let rules: Vec<&str> = v.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["forbidden in global: psycopg2", "forbidden in services: psycopg*"]
        );
    }

    #[test]
    fn selective_members_are_matched() {
        let mut e = external("payments", "lodash", 1);
        e.target = EdgeTarget::External {
            module: module("lodash"),
            members: vec![module("fp")],
        };
        let v = forbidden_dependencies(&[e], &policy());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].target, "lodash");
    }

    #[test]
    fn passes_are_independent() {
        let edges = [ctx("services", "payments", 1), external("services", "boto3", 1)];
        let p = policy();
        assert_eq!(boundary_violations(&edges, &p).len(), 1);
        assert_eq!(forbidden_dependencies(&edges, &p).len(), 1);
    }

    #[test]
    fn reachable_contexts_respect_wildcards() {
        let p = policy();
        let reach: Vec<String> = reachable_contexts(&p, &name("api"))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(reach, vec!["inventory", "payments", "services", "shared", "shipping"]);
        assert!(reachable_contexts(&p, &name("shared")).is_empty());
    }
}
