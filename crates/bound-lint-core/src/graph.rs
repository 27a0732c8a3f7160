//! Resolves import facts into context-level dependency edges.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::classifier::{Classification, Classifier};
use crate::extract::{ImportFact, ImportForm, ModulePath};
use crate::policy::{ContextName, Policy};
use crate::scanner::SourceFile;
use crate::utils::paths::{path_segments, strip_source_extension};

/// What an edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeTarget {
    /// An in-tree module owned by a context.
    Context(ContextName),
    /// A module outside the scanned tree, with any selectively imported
    /// names.
    External {
        /// Module path as written, normalized.
        module: ModulePath,
        /// Selectively imported names.
        members: Vec<ModulePath>,
    },
    /// An in-tree module no context claims.
    Unassigned(PathBuf),
}

impl fmt::Display for EdgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(name) => write!(f, "{name}"),
            Self::External { module, .. } => write!(f, "{module}"),
            Self::Unassigned(path) => write!(f, "{}", crate::utils::slash_path(path)),
        }
    }
}

/// One reference from a context to a target, tied to its statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Context of the importing file.
    pub source: ContextName,
    /// Resolved target.
    pub target: EdgeTarget,
    /// Importing file, relative to the root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Statement ordinal within the file.
    pub statement: usize,
    /// Module text as written.
    pub raw: String,
}

#[derive(Debug, Clone)]
enum ModuleKind {
    File(PathBuf),
    Dir,
}

/// Every in-tree module path: file stems and their ancestor directories.
#[derive(Debug, Default)]
struct ModuleIndex {
    modules: HashMap<Vec<String>, ModuleKind>,
}

impl ModuleIndex {
    fn new(files: &[SourceFile]) -> Self {
        let mut modules = HashMap::new();
        for file in files {
            let mut segments = path_segments(&file.relative);
            let Some(last) = segments.pop() else {
                continue;
            };
            for depth in 1..=segments.len() {
                modules
                    .entry(segments[..depth].to_vec())
                    .or_insert(ModuleKind::Dir);
            }
            segments.push(strip_source_extension(&last).to_string());
            modules.insert(segments, ModuleKind::File(file.relative.clone()));
        }
        Self { modules }
    }

    /// Longest known module path that extends `full` beyond `floor`
    /// segments.
    fn longest_prefix<'a>(&self, full: &'a [String], floor: usize) -> Option<(&'a [String], &ModuleKind)> {
        (floor + 1..=full.len())
            .rev()
            .find_map(|n| self.modules.get(&full[..n]).map(|kind| (&full[..n], kind)))
    }
}

/// The context-level dependency graph of one analysis run.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    members: BTreeMap<ContextName, Vec<PathBuf>>,
}

impl DependencyGraph {
    /// Builds the graph from classified files and their facts.
    ///
    /// Absolute references resolve against each module root in order and
    /// then the scan root; the longest in-tree prefix wins. A reference that
    /// misses the tree but falls under the prefix of a context the policy
    /// names still belongs to that context. Anything else is external. Relative references never
    /// leave the tree. Facts from unclassified files are dropped.
    #[must_use]
    pub fn build(
        files: &[SourceFile],
        facts: &[ImportFact],
        classifier: &Classifier,
        policy: &Policy,
        module_roots: &[String],
    ) -> Self {
        let index = ModuleIndex::new(files);
        let roots: Vec<Vec<String>> = module_roots
            .iter()
            .map(|r| path_segments(Path::new(r)))
            .chain(std::iter::once(Vec::new()))
            .collect();

        let mut members: BTreeMap<ContextName, Vec<PathBuf>> = BTreeMap::new();
        let mut owner: HashMap<&Path, &ContextName> = HashMap::new();
        for file in files {
            if let Some(context) = &file.context {
                members
                    .entry(context.clone())
                    .or_default()
                    .push(file.relative.clone());
                owner.insert(&file.relative, context);
            }
        }

        let known: BTreeSet<&ContextName> = policy
            .declared_contexts()
            .into_iter()
            .chain(policy.forward_declared())
            .collect();
        let resolver = Resolver {
            index: &index,
            classifier,
            known,
            roots: &roots,
        };

        let mut edges = Vec::new();
        for fact in facts {
            let Some(source) = owner.get(fact.file.as_path()) else {
                continue;
            };
            for target in resolver.resolve(fact) {
                edges.push(DependencyEdge {
                    source: (*source).clone(),
                    target,
                    file: fact.file.clone(),
                    line: fact.line,
                    statement: fact.statement,
                    raw: fact.raw.clone(),
                });
            }
        }
        edges.sort_by(|a, b| (&a.file, a.statement).cmp(&(&b.file, b.statement)));

        Self { edges, members }
    }

    /// All edges, ordered by file then statement.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Member files per context, in scan order.
    #[must_use]
    pub fn members(&self) -> &BTreeMap<ContextName, Vec<PathBuf>> {
        &self.members
    }

    /// Number of context → other-context edges per pair.
    #[must_use]
    pub fn context_dependencies(&self) -> BTreeMap<(ContextName, ContextName), usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.edges {
            if let EdgeTarget::Context(target) = &edge.target {
                if *target != edge.source {
                    *counts
                        .entry((edge.source.clone(), target.clone()))
                        .or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

struct Resolver<'a> {
    index: &'a ModuleIndex,
    classifier: &'a Classifier,
    known: BTreeSet<&'a ContextName>,
    roots: &'a [Vec<String>],
}

impl Resolver<'_> {
    /// Distinct targets of one statement, in candidate order.
    fn resolve(&self, fact: &ImportFact) -> Vec<EdgeTarget> {
        let relative = matches!(fact.form, ImportForm::Relative { .. });

        let mut candidates: Vec<Vec<ModulePath>> = fact
            .members
            .iter()
            .map(|m| vec![fact.module.join(m), fact.module.clone()])
            .collect();
        if candidates.is_empty() {
            candidates.push(vec![fact.module.clone()]);
        }

        let mut targets = Vec::new();
        for alternatives in &candidates {
            let resolved = alternatives.iter().find_map(|candidate| {
                if relative {
                    self.in_tree(candidate.segments(), &[Vec::new()])
                } else {
                    self.in_tree(candidate.segments(), self.roots)
                }
            });
            if let Some(target) = resolved {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        if targets.is_empty() {
            if relative {
                targets.push(self.unresolved_relative(&fact.module));
            } else if !fact.module.is_empty() || !fact.members.is_empty() {
                targets.push(EdgeTarget::External {
                    module: fact.module.clone(),
                    members: fact.members.clone(),
                });
            }
        }
        targets
    }

    fn in_tree(&self, segments: &[String], roots: &[Vec<String>]) -> Option<EdgeTarget> {
        if segments.is_empty() {
            return None;
        }

        for root in roots {
            let full: Vec<String> = root.iter().chain(segments).cloned().collect();
            if let Some((found, kind)) = self.index.longest_prefix(&full, root.len()) {
                let classification = match kind {
                    ModuleKind::File(path) => self.classifier.classify(path),
                    ModuleKind::Dir => self.classifier.classify_dir(found),
                };
                return Some(match classification {
                    Classification::Context(name) => EdgeTarget::Context(name),
                    Classification::Unclassified => {
                        EdgeTarget::Unassigned(found.iter().collect())
                    }
                });
            }
        }

        // Named contexts with no scanned files still claim their prefixes.
        roots.iter().find_map(|root| {
            let full: Vec<String> = root.iter().chain(segments).cloned().collect();
            self.classifier
                .classify_dir(&full)
                .context()
                .filter(|name| self.known.contains(name))
                .cloned()
                .map(EdgeTarget::Context)
        })
    }

    fn unresolved_relative(&self, module: &ModulePath) -> EdgeTarget {
        match self.classifier.classify_dir(module.segments()) {
            Classification::Context(name) => EdgeTarget::Context(name),
            Classification::Unclassified => EdgeTarget::Unassigned(module.to_path()),
        }
    }
}
