//! Groups violations per context and renders run results.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::Serialize;

use crate::graph::DependencyGraph;
use crate::policy::Policy;
use crate::types::{Violation, ViolationKind, Warning};
use crate::utils::slash_path;

/// Outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// No violations.
    Pass,
    /// At least one violation.
    Fail,
    /// A file cap or the timeout cut the run short.
    Truncated,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::Truncated => 3,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Truncated => write!(f, "truncated"),
        }
    }
}

/// Counters gathered while the run progressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Candidate files handed to extraction.
    pub files_scanned: usize,
    /// Files a context claimed.
    pub files_classified: usize,
    /// Import facts extracted.
    pub facts: usize,
    /// A cap or the timeout was hit.
    pub truncated: bool,
}

/// Run totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Candidate files handed to extraction.
    pub files_scanned: usize,
    /// Files a context claimed.
    pub files_classified: usize,
    /// Files no context claimed.
    pub files_unassigned: usize,
    /// Import facts extracted.
    pub facts: usize,
    /// Dependency edges built.
    pub edges: usize,
    /// Boundary violations.
    pub boundary_violations: usize,
    /// Forbidden-dependency violations.
    pub forbidden_dependencies: usize,
    /// Soft warnings.
    pub warnings: usize,
}

/// One context's slice of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSection {
    /// Context name.
    pub name: String,
    /// Number of member files.
    pub members: usize,
    /// Violations from this context's files, in report order.
    pub violations: Vec<Violation>,
}

/// A context-to-context dependency count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextDependency {
    /// Importing context.
    pub source: String,
    /// Imported context.
    pub target: String,
    /// Number of edges.
    pub edges: usize,
}

/// The result of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    status: RunStatus,
    summary: Summary,
    contexts: Vec<ContextSection>,
    dependencies: Vec<ContextDependency>,
    unused_contexts: Vec<String>,
    forward_declared: Vec<String>,
    violations: Vec<Violation>,
    warnings: Vec<Warning>,
}

impl Report {
    /// Assembles a report. Violations and warnings are re-sorted, so the
    /// result does not depend on input order.
    #[must_use]
    pub fn new(
        policy: &Policy,
        graph: &DependencyGraph,
        mut violations: Vec<Violation>,
        mut warnings: Vec<Warning>,
        stats: RunStats,
    ) -> Self {
        violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        warnings.sort();

        let count = |kind| violations.iter().filter(|v| v.kind == kind).count();
        let summary = Summary {
            files_scanned: stats.files_scanned,
            files_classified: stats.files_classified,
            files_unassigned: stats.files_scanned.saturating_sub(stats.files_classified),
            facts: stats.facts,
            edges: graph.edges().len(),
            boundary_violations: count(ViolationKind::BoundaryViolation),
            forbidden_dependencies: count(ViolationKind::ForbiddenDependency),
            warnings: warnings.len(),
        };

        let named: BTreeSet<String> = policy
            .declared_contexts()
            .into_iter()
            .chain(policy.forward_declared())
            .map(ToString::to_string)
            .collect();
        let mut all: BTreeSet<String> = named.clone();
        all.extend(graph.members().keys().map(ToString::to_string));

        let contexts = all
            .iter()
            .map(|name| ContextSection {
                name: name.clone(),
                members: graph
                    .members()
                    .iter()
                    .find(|(k, _)| k.as_str() == name)
                    .map_or(0, |(_, files)| files.len()),
                violations: violations
                    .iter()
                    .filter(|v| &v.context == name)
                    .cloned()
                    .collect(),
            })
            .collect::<Vec<_>>();

        let unused_contexts = contexts
            .iter()
            .filter(|c| c.members == 0 && named.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();

        let dependencies = graph
            .context_dependencies()
            .into_iter()
            .map(|((source, target), edges)| ContextDependency {
                source: source.to_string(),
                target: target.to_string(),
                edges,
            })
            .collect();

        let status = if stats.truncated {
            RunStatus::Truncated
        } else if violations.is_empty() {
            RunStatus::Pass
        } else {
            RunStatus::Fail
        };

        Self {
            status,
            summary,
            contexts,
            dependencies,
            unused_contexts,
            forward_declared: policy
                .forward_declared()
                .iter()
                .map(ToString::to_string)
                .collect(),
            violations,
            warnings,
        }
    }

    /// Run status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Process exit code: 0 pass, 1 violations, 3 truncated.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.status.exit_code()
    }

    /// Run totals.
    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Per-context sections, sorted by name.
    #[must_use]
    pub fn contexts(&self) -> &[ContextSection] {
        &self.contexts
    }

    /// Context-to-context edge counts.
    #[must_use]
    pub fn dependencies(&self) -> &[ContextDependency] {
        &self.dependencies
    }

    /// Named contexts with no member files.
    #[must_use]
    pub fn unused_contexts(&self) -> &[String] {
        &self.unused_contexts
    }

    /// Contexts referenced by the policy but never declared.
    #[must_use]
    pub fn forward_declared(&self) -> &[String] {
        &self.forward_declared
    }

    /// All violations ordered by file, line, statement and kind.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Soft warnings.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns true if any violation was found.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    // ────────────────────────────────────────────
    // Renderers
    // ────────────────────────────────────────────

    /// One-line verdict.
    #[must_use]
    pub fn status_line(&self) -> String {
        let s = &self.summary;
        match self.status {
            RunStatus::Pass => format!("bound-lint: pass ({} files checked)", s.files_scanned),
            RunStatus::Fail => format!(
                "bound-lint: fail ({} violation(s) in {} files)",
                self.violations.len(),
                s.files_scanned
            ),
            RunStatus::Truncated => format!(
                "bound-lint: truncated ({} violation(s) in {} files before the run was cut short)",
                self.violations.len(),
                s.files_scanned
            ),
        }
    }

    /// Human-readable report.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.status_line());

        for section in &self.contexts {
            if section.violations.is_empty() {
                let _ = writeln!(out, "\n{} ({} file(s)): clean", section.name, section.members);
                continue;
            }
            let _ = writeln!(
                out,
                "\n{} ({} file(s), {} violation(s))",
                section.name,
                section.members,
                section.violations.len()
            );
            for v in &section.violations {
                let _ = writeln!(out, "  {v}");
                let _ = writeln!(out, "    = rule: {}", v.rule);
            }
        }

        if !self.dependencies.is_empty() {
            let _ = writeln!(out, "\nContext dependencies:");
            for d in &self.dependencies {
                let _ = writeln!(out, "  {} -> {} ({})", d.source, d.target, d.edges);
            }
        }

        if !self.unused_contexts.is_empty() {
            let _ = writeln!(out, "\nUnused contexts: {}", self.unused_contexts.join(", "));
        }
        if !self.forward_declared.is_empty() {
            let _ = writeln!(
                out,
                "Forward-declared contexts: {}",
                self.forward_declared.join(", ")
            );
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings:");
            for w in &self.warnings {
                let _ = writeln!(out, "  {w}");
            }
        }

        let s = &self.summary;
        let _ = writeln!(
            out,
            "\nSummary: {} scanned, {} classified, {} unassigned, {} facts, {} edges",
            s.files_scanned, s.files_classified, s.files_unassigned, s.facts, s.edges
        );
        let _ = writeln!(
            out,
            "Totals: {} boundary-violation, {} forbidden-dependency, {} warning(s)",
            s.boundary_violations, s.forbidden_dependencies, s.warnings
        );
        out
    }

    /// One line per violation: `file:line: [code] message`.
    #[must_use]
    pub fn render_compact(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{v}\n"))
            .collect()
    }

    /// JSON report.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let doc = JsonReport {
            status: self.status,
            summary: &self.summary,
            contexts: self.contexts.iter().map(JsonContext::from).collect(),
            violations: self.violations.iter().map(JsonViolation::from).collect(),
            warnings: &self.warnings,
            unused_contexts: &self.unused_contexts,
            forward_declared: &self.forward_declared,
            dependencies: &self.dependencies,
        };
        serde_json::to_string_pretty(&doc)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: RunStatus,
    summary: &'a Summary,
    contexts: Vec<JsonContext<'a>>,
    violations: Vec<JsonViolation<'a>>,
    warnings: &'a [Warning],
    unused_contexts: &'a [String],
    forward_declared: &'a [String],
    dependencies: &'a [ContextDependency],
}

#[derive(Serialize)]
struct JsonContext<'a> {
    name: &'a str,
    members: usize,
    violations: usize,
    clean: bool,
}

impl<'a> From<&'a ContextSection> for JsonContext<'a> {
    fn from(section: &'a ContextSection) -> Self {
        Self {
            name: &section.name,
            members: section.members,
            violations: section.violations.len(),
            clean: section.violations.is_empty(),
        }
    }
}

#[derive(Serialize)]
struct JsonViolation<'a> {
    context: &'a str,
    file: String,
    line: usize,
    statement: usize,
    kind: ViolationKind,
    code: &'a str,
    target: &'a str,
    message: &'a str,
}

impl<'a> From<&'a Violation> for JsonViolation<'a> {
    fn from(v: &'a Violation) -> Self {
        Self {
            context: &v.context,
            file: slash_path(&v.location.file),
            line: v.location.line,
            statement: v.location.statement,
            kind: v.kind,
            code: &v.code,
            target: &v.target,
            message: &v.message,
        }
    }
}
