//! Contexts command implementation.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use bound_lint_core::{reachable_contexts, Analyzer, ContextName, ScanOutcome, ViolationKind};
use serde_json::json;

use crate::OutputFormat;

/// One context as shown by `bound-lint contexts`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContextRow {
    name: String,
    paths: Vec<String>,
    allowed: String,
    reachable: Vec<String>,
    forbidden: Vec<String>,
    members: usize,
    forward_declared: bool,
}

/// Runs the contexts command.
///
/// # Errors
///
/// Returns an error if the policy cannot be resolved or loaded.
pub fn run(path: Option<&Path>, policy: Option<&Path>, format: OutputFormat) -> Result<()> {
    let analyzer = super::analyzer_for(path, policy)?.build()?;
    let outcome = analyzer.classify_files();
    for warning in &outcome.warnings {
        tracing::warn!("{warning}");
    }
    let rows = context_rows(&analyzer, &outcome);

    match format {
        OutputFormat::Json => println!("{}", render_json(&analyzer, &rows)?),
        OutputFormat::Text | OutputFormat::Compact => print!("{}", render_text(&analyzer, &rows)),
    }
    Ok(())
}

fn context_rows(analyzer: &Analyzer, outcome: &ScanOutcome) -> Vec<ContextRow> {
    let policy = analyzer.policy();
    let classifier = analyzer.classifier();

    let mut names: BTreeSet<ContextName> = policy
        .declared_contexts()
        .into_iter()
        .chain(policy.forward_declared())
        .cloned()
        .collect();
    names.extend(outcome.files.iter().filter_map(|f| f.context.clone()));

    names
        .into_iter()
        .map(|name| {
            let mut paths: Vec<String> = classifier
                .rules()
                .iter()
                .filter(|(_, owner)| *owner == name)
                .map(|(prefix, _)| prefix.to_string())
                .collect();
            if paths.is_empty() {
                if let Some(root) = classifier.contexts_root() {
                    paths.push(format!("{root}/{name}"));
                }
            }

            let forbidden = policy
                .forbidden_for(&name)
                .flat_map(|rule| {
                    rule.patterns()
                        .iter()
                        .map(move |p| format!("{} ({})", p.as_str(), rule.scope()))
                })
                .collect();

            ContextRow {
                paths,
                allowed: policy.describe_allowed(&name),
                reachable: reachable_contexts(policy, &name)
                    .into_iter()
                    .map(ToString::to_string)
                    .collect(),
                forbidden,
                members: outcome
                    .files
                    .iter()
                    .filter(|f| f.context.as_ref() == Some(&name))
                    .count(),
                forward_declared: policy.forward_declared().contains(&name),
                name: name.to_string(),
            }
        })
        .collect()
}

fn render_text(analyzer: &Analyzer, rows: &[ContextRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Contexts in {} (default policy: {})\n",
        analyzer.root().display(),
        analyzer.policy().default_policy()
    );

    for row in rows {
        let marker = if row.forward_declared {
            " [forward-declared]"
        } else if row.members == 0 {
            " [unused]"
        } else {
            ""
        };
        let _ = writeln!(out, "{}{marker}", row.name);
        if !row.paths.is_empty() {
            let _ = writeln!(out, "  paths:     {}", row.paths.join(", "));
        }
        let _ = writeln!(out, "  allowed:   {}", row.allowed);
        if !row.reachable.is_empty() {
            let _ = writeln!(out, "  reaches:   {}", row.reachable.join(", "));
        }
        if !row.forbidden.is_empty() {
            let _ = writeln!(out, "  forbidden: {}", row.forbidden.join(", "));
        }
        let _ = writeln!(out, "  members:   {} file(s)\n", row.members);
    }

    let _ = writeln!(out, "Rules:");
    for kind in [ViolationKind::BoundaryViolation, ViolationKind::ForbiddenDependency] {
        let _ = writeln!(
            out,
            "  {:<6} {:<22} {}",
            kind.code(),
            kind.name(),
            kind.description()
        );
    }
    out
}

fn render_json(analyzer: &Analyzer, rows: &[ContextRow]) -> Result<String> {
    let contexts: Vec<_> = rows
        .iter()
        .map(|row| {
            json!({
                "name": row.name,
                "paths": row.paths,
                "allowed": row.allowed,
                "reachable": row.reachable,
                "forbidden": row.forbidden,
                "members": row.members,
                "forward_declared": row.forward_declared,
            })
        })
        .collect();
    let doc = json!({
        "default_policy": analyzer.policy().default_policy().to_string(),
        "contexts": contexts,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}
