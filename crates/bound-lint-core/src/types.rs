//! Core types for boundary violations and soft warnings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The two rule families a violation can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// An import crossing into a context outside the source's allow-list.
    BoundaryViolation,
    /// An import of an external library forbidden in the source's scope.
    ForbiddenDependency,
}

impl ViolationKind {
    /// Stable rule code (e.g., "BL001").
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::BoundaryViolation => "BL001",
            Self::ForbiddenDependency => "BL002",
        }
    }

    /// Kebab-case rule name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BoundaryViolation => "boundary-violation",
            Self::ForbiddenDependency => "forbidden-dependency",
        }
    }

    /// One-line description used by `bound-lint contexts`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::BoundaryViolation => "Context imports a context missing from its allow-list",
            Self::ForbiddenDependency => "Context imports an external library forbidden in its scope",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an import statement sits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the scanned root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Import statement ordinal within the file (0-indexed).
    pub statement: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, statement: usize) -> Self {
        Self {
            file,
            line,
            statement,
        }
    }
}

/// A policy violation. Every violation is a hard failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Which rule family fired.
    pub kind: ViolationKind,
    /// Rule code (e.g., "BL001").
    pub code: String,
    /// Context the offending file belongs to.
    pub context: String,
    /// Location of the offending import statement.
    pub location: Location,
    /// Offending target: a context name or an external module as written.
    pub target: String,
    /// The rule that was broken, rendered for humans.
    pub rule: String,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    /// Creates a new violation; the code is derived from the kind.
    #[must_use]
    pub fn new(
        kind: ViolationKind,
        context: impl Into<String>,
        location: Location,
        target: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            context: context.into(),
            location,
            target: target.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Ordering key: file, line, statement, kind, target.
    pub(crate) fn sort_key(&self) -> (&PathBuf, usize, usize, ViolationKind, &str) {
        (
            &self.location.file,
            self.location.line,
            self.location.statement,
            self.kind,
            &self.target,
        )
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}",
            crate::utils::slash_path(&self.location.file),
            self.location.line,
            self.code,
            self.message
        )
    }
}

/// Kinds of recoverable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Import statements could not be parsed; the file contributes no facts.
    Parse,
    /// File could not be read; it was skipped.
    FileRead,
    /// A directory entry could not be walked (permissions, symlink loop).
    Scan,
    /// A relative import points outside the scanned root.
    UnresolvedImport,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::FileRead => write!(f, "file-read"),
            Self::Scan => write!(f, "scan"),
            Self::UnresolvedImport => write!(f, "unresolved-import"),
        }
    }
}

/// A soft warning surfaced next to the violation report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Warning {
    /// What went wrong.
    pub kind: WarningKind,
    /// File or directory the warning is about, relative to the root when possible.
    pub file: PathBuf,
    /// Line number (1-indexed), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Detail message.
    pub message: String,
}

impl Warning {
    /// Creates a new warning without a line.
    #[must_use]
    pub fn new(kind: WarningKind, file: PathBuf, message: impl Into<String>) -> Self {
        Self {
            kind,
            file,
            line: None,
            message: message.into(),
        }
    }

    /// Attaches a line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "warning[{}]: {}",
            self.kind,
            crate::utils::slash_path(&self.file)
        )?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation() -> Violation {
        Violation::new(
            ViolationKind::BoundaryViolation,
            "payments",
            Location::new(PathBuf::from("src/payments/api.py"), 3, 1),
            "inventory",
            "payments -> [shared]",
            "`payments` may not depend on `inventory`",
        )
    }

    #[test]
    fn code_follows_kind() {
        let v = make_violation();
        assert_eq!(v.code, "BL001");
        assert_eq!(ViolationKind::ForbiddenDependency.code(), "BL002");
    }

    #[test]
    fn violation_display_is_compact() {
        let v = make_violation();
        assert_eq!(
            v.to_string(),
            "src/payments/api.py:3: [BL001] `payments` may not depend on `inventory`"
        );
    }

    #[test]
    fn warning_display_includes_line_when_known() {
        let w = Warning::new(
            WarningKind::Parse,
            PathBuf::from("src/broken.py"),
            "expected module name",
        )
        .at_line(4);
        assert_eq!(
            w.to_string(),
            "warning[parse]: src/broken.py:4: expected module name"
        );
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&ViolationKind::ForbiddenDependency).unwrap();
        assert_eq!(json, "\"forbidden-dependency\"");
        let json = serde_json::to_string(&WarningKind::FileRead).unwrap();
        assert_eq!(json, "\"file-read\"");
    }
}
