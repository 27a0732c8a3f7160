//! Path and module-path utilities shared by the scanner, extractor, and graph.

use std::path::{Component, Path};

/// Splits a root-relative path into its normal components.
///
/// `.` components are dropped; `..` and root/prefix components are kept out
/// because relative paths handed around the engine never contain them.
#[must_use]
pub fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Renders a root-relative path with `/` separators regardless of platform.
#[must_use]
pub fn slash_path(path: &Path) -> String {
    path_segments(path).join("/")
}

/// Splits a dependency name or pattern into comparable segments.
///
/// `::`, `.` and `/` are all treated as separators so that `sqlx::Pool`,
/// `sqlalchemy.orm` and `lodash/fp` are matched the same way.
#[must_use]
pub fn dependency_segments(name: &str) -> Vec<String> {
    name.replace("::", ".")
        .split(['.', '/'])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Returns true if `prefix` is a component-wise prefix of `path`.
///
/// `["src", "pay"]` is not a prefix of `["src", "payments"]`.
#[must_use]
pub fn has_segment_prefix<S: AsRef<str>>(path: &[S], prefix: &[S]) -> bool {
    prefix.len() <= path.len()
        && path
            .iter()
            .zip(prefix)
            .all(|(a, b)| a.as_ref() == b.as_ref())
}

/// One segment of a compiled dependency pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPattern {
    /// `**`: any number of segments, including none.
    AnyDepth,
    /// A single segment, possibly containing glob wildcards (`psycopg*`).
    Glob(glob::Pattern),
}

/// Matches name segments against pattern segments.
///
/// Patterns match by prefix: once every pattern segment is consumed the
/// remaining name segments are ignored, so `sqlalchemy` matches
/// `sqlalchemy.orm.session`.
#[must_use]
pub fn segments_match(name: &[String], pattern: &[SegmentPattern]) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return true;
    };

    match first {
        SegmentPattern::AnyDepth => (0..=name.len()).any(|i| segments_match(&name[i..], rest)),
        SegmentPattern::Glob(glob) => match name.split_first() {
            Some((head, tail)) => glob.matches(head) && segments_match(tail, rest),
            None => false,
        },
    }
}

/// Strips a known source-file extension from the last segment.
#[must_use]
pub fn strip_source_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && crate::extract::Dialect::from_extension(ext).is_some() =>
        {
            stem
        }
        _ => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn compile(pattern: &str) -> Vec<SegmentPattern> {
        dependency_segments(pattern)
            .iter()
            .map(|s| {
                if s == "**" {
                    SegmentPattern::AnyDepth
                } else {
                    SegmentPattern::Glob(glob::Pattern::new(s).unwrap())
                }
            })
            .collect()
    }

    fn name(s: &str) -> Vec<String> {
        dependency_segments(s)
    }

    #[test]
    fn segments_skip_curdir() {
        assert_eq!(
            path_segments(&PathBuf::from("./src/domains/payments.py")),
            vec!["src", "domains", "payments.py"]
        );
    }

    #[test]
    fn dependency_segments_accept_every_separator() {
        assert_eq!(name("sqlx::Pool"), vec!["sqlx", "Pool"]);
        assert_eq!(name("sqlalchemy.orm"), vec!["sqlalchemy", "orm"]);
        assert_eq!(name("@aws-sdk/client-s3"), vec!["@aws-sdk", "client-s3"]);
    }

    #[test]
    fn segment_prefix_respects_boundaries() {
        let path = name("src/payments/api");
        assert!(has_segment_prefix(&path, &name("src/payments")));
        assert!(!has_segment_prefix(&path, &name("src/pay")));
        assert!(has_segment_prefix(&path, &[] as &[String]));
    }

    #[test]
    fn bare_pattern_matches_submodules() {
        assert!(segments_match(&name("sqlalchemy"), &compile("sqlalchemy")));
        assert!(segments_match(&name("sqlalchemy.orm"), &compile("sqlalchemy")));
        assert!(!segments_match(&name("sqlalchemy_utils"), &compile("sqlalchemy")));
    }

    #[test]
    fn wildcard_segments() {
        assert!(segments_match(&name("psycopg2"), &compile("psycopg*")));
        assert!(segments_match(&name("java.sql.Connection"), &compile("java.*.Connection")));
        assert!(!segments_match(&name("java.Connection"), &compile("java.*.Connection")));
        assert!(segments_match(&name("std.fs.read"), &compile("**.fs")));
    }

    #[test]
    fn strips_only_source_extensions() {
        assert_eq!(strip_source_extension("stock.py"), "stock");
        assert_eq!(strip_source_extension("client.ts"), "client");
        assert_eq!(strip_source_extension("lodash.debounce"), "lodash.debounce");
        assert_eq!(strip_source_extension(".py"), ".py");
    }
}
