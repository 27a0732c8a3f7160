//! Import extraction: source text in, normalized [`ImportFact`]s out.
//!
//! Each dialect implements [`DialectExtractor`] over a statement-level
//! tokenizer (or `syn` for Rust). Every import shape, whether plain,
//! aliased, selective, or relative, normalizes to the same fact: *this file
//! references that module path*.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{Warning, WarningKind};
use crate::utils::paths::path_segments;

mod ecmascript;
mod jvm;
mod lexer;
mod python;
mod rust;

pub use ecmascript::EcmaScriptExtractor;
pub use jvm::JvmExtractor;
pub use python::PythonExtractor;
pub use rust::RustExtractor;

/// Source dialect, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dialect {
    /// Python (`.py`, `.pyi`).
    Python,
    /// JavaScript and TypeScript.
    EcmaScript,
    /// Kotlin, Java and Scala.
    Jvm,
    /// Rust.
    Rust,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Self; 4] = [Self::Python, Self::EcmaScript, Self::Jvm, Self::Rust];

    /// Dialect identifier.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::EcmaScript => "ecmascript",
            Self::Jvm => "jvm",
            Self::Rust => "rust",
        }
    }

    /// File extensions (without the dot) handled by this dialect.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["py", "pyi"],
            Self::EcmaScript => &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"],
            Self::Jvm => &["kt", "kts", "java", "scala"],
            Self::Rust => &["rs"],
        }
    }

    /// Looks up the dialect for a bare extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.extensions().contains(&ext))
    }

    /// Looks up the dialect for a file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    fn extractor(self) -> &'static dyn DialectExtractor {
        match self {
            Self::Python => &PythonExtractor,
            Self::EcmaScript => &EcmaScriptExtractor,
            Self::Jvm => &JvmExtractor,
            Self::Rust => &RustExtractor,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A module path as a list of segments (`inventory.stock` → `["inventory", "stock"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// Creates a module path from segments.
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Returns the segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends another path.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Renders as a root-relative filesystem path.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        self.0.iter().collect()
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for ModulePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// How the import statement addressed its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportForm {
    /// Resolved against module roots, or external.
    Absolute,
    /// Relative to the importing file. `level` counts the `.`/`..`/`super`
    /// steps as written.
    Relative {
        /// Relative depth as written.
        level: usize,
    },
}

/// One import statement as a dialect parser sees it, before relative
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Line number (1-indexed).
    pub line: usize,
    /// Module text as written.
    pub raw: String,
    /// Absolute or relative.
    pub form: ImportForm,
    /// Module segments as written (relative steps removed).
    pub module: ModulePath,
    /// Selectively imported names, each possibly a submodule.
    pub members: Vec<ModulePath>,
}

impl RawImport {
    pub(crate) fn absolute(line: usize, raw: impl Into<String>, module: ModulePath) -> Self {
        Self {
            line,
            raw: raw.into(),
            form: ImportForm::Absolute,
            module,
            members: Vec::new(),
        }
    }

    pub(crate) fn with_members(mut self, members: Vec<ModulePath>) -> Self {
        self.members = members;
        self
    }
}

/// A normalized import fact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFact {
    /// Importing file, relative to the scanned root.
    pub file: PathBuf,
    /// Ordinal of the import statement within the file.
    pub statement: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Module text as written.
    pub raw: String,
    /// Absolute or relative, as written.
    pub form: ImportForm,
    /// Referenced module. For relative imports this is already resolved to a
    /// root-relative path.
    pub module: ModulePath,
    /// Selectively imported names.
    pub members: Vec<ModulePath>,
}

/// A syntax problem that invalidates a file's import block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Line number (1-indexed) where the problem was noticed.
    pub line: usize,
    /// What was wrong.
    pub message: String,
}

impl ParseFailure {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Trait for dialect-specific import extraction.
///
/// Implement this to add support for a new dialect. Extractors only look
/// at import statements; everything else in the file is skipped.
pub trait DialectExtractor: Send + Sync {
    /// The dialect handled.
    fn dialect(&self) -> Dialect;

    /// Parses every import statement in source order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure`] when an import statement is malformed.
    fn parse_imports(&self, source: &str) -> Result<Vec<RawImport>, ParseFailure>;

    /// Resolves a relative import of `level` steps from `file` into a
    /// root-relative module path. Returns `None` if it escapes the root.
    ///
    /// The default treats level 1 as the file's own directory and each
    /// further level as one directory up (Python dots, `./` and `../`).
    fn resolve_relative(&self, file: &Path, level: usize, module: &ModulePath) -> Option<ModulePath> {
        let mut base = path_segments(file);
        base.pop();
        let ups = level.saturating_sub(1);
        if ups > base.len() {
            return None;
        }
        base.truncate(base.len() - ups);
        Some(ModulePath::new(base).join(module))
    }
}

/// Facts and warnings extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Facts in statement order.
    pub facts: Vec<ImportFact>,
    /// Soft warnings for this file.
    pub warnings: Vec<Warning>,
}

/// Extracts import facts from one file's text.
///
/// A malformed import block yields a single [`WarningKind::Parse`] warning
/// and no facts. Relative imports that climb above the root are dropped with
/// an [`WarningKind::UnresolvedImport`] warning. A leading byte-order mark
/// is ignored.
#[must_use]
pub fn extract(file: &Path, dialect: Dialect, source: &str) -> Extraction {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let extractor = dialect.extractor();

    let raw_imports = match extractor.parse_imports(source) {
        Ok(imports) => imports,
        Err(failure) => {
            tracing::warn!(
                "Failed to parse imports in {}: {}",
                file.display(),
                failure.message
            );
            return Extraction {
                facts: Vec::new(),
                warnings: vec![Warning::new(
                    WarningKind::Parse,
                    file.to_path_buf(),
                    failure.message,
                )
                .at_line(failure.line)],
            };
        }
    };

    let mut extraction = Extraction::default();
    for (statement, import) in raw_imports.into_iter().enumerate() {
        let module = match import.form {
            ImportForm::Absolute => import.module,
            ImportForm::Relative { level } => {
                if let Some(resolved) = extractor.resolve_relative(file, level, &import.module) {
                    resolved
                } else {
                    extraction.warnings.push(
                        Warning::new(
                            WarningKind::UnresolvedImport,
                            file.to_path_buf(),
                            format!("relative import `{}` escapes the scanned root", import.raw),
                        )
                        .at_line(import.line),
                    );
                    continue;
                }
            }
        };

        extraction.facts.push(ImportFact {
            file: file.to_path_buf(),
            statement,
            line: import.line,
            raw: import.raw,
            form: import.form,
            module,
            members: import.members,
        });
    }

    extraction
}
