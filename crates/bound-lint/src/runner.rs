//! Internal runner for `check!()` macro integration.
//!
//! This module is `#[doc(hidden)]` and not part of the public API.
//! It is called by the test function generated by `bound_lint::check!()`.

use bound_lint_core::{Analyzer, RunStatus};
use std::path::{Path, PathBuf};

/// Policy file names to search for, in priority order.
const POLICY_CANDIDATES: &[&str] = &["bound-lint.toml", ".bound-lint.toml"];

/// Runs bound-lint analysis as part of `cargo test`.
///
/// Called by the `check!()` macro-generated test function.
///
/// # Panics
///
/// Panics with the text report if the run does not pass, or if no policy
/// can be found or loaded.
pub fn run_check(policy: Option<&str>) {
    let manifest_dir = manifest_dir();
    let workspace = find_workspace_root(&manifest_dir);
    let policy_path = locate_policy(&manifest_dir, &workspace, policy);

    let analyzer = Analyzer::builder()
        .policy_file(&policy_path)
        .build()
        .unwrap_or_else(|e| {
            panic!(
                "bound-lint: failed to load policy {}: {e}",
                policy_path.display()
            );
        });

    let report = analyzer.analyze().unwrap_or_else(|e| {
        panic!("bound-lint: analysis failed: {e}");
    });

    assert!(
        report.status() == RunStatus::Pass,
        "{}",
        report.render_text()
    );
}

/// Picks the policy file for a run.
///
/// An explicit path is taken relative to the workspace root. Otherwise the
/// crate directory is searched before the workspace root.
fn locate_policy(manifest_dir: &Path, workspace: &Path, explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        let path = Path::new(path);
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            workspace.join(path)
        };
        assert!(
            full.is_file(),
            "bound-lint: policy file not found: {}",
            full.display()
        );
        return full;
    }

    let mut dirs = vec![manifest_dir];
    if workspace != manifest_dir {
        dirs.push(workspace);
    }
    for dir in &dirs {
        for candidate in POLICY_CANDIDATES {
            let path = dir.join(candidate);
            if path.is_file() {
                return path;
            }
        }
    }

    let searched: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    panic!(
        "bound-lint: no policy file found (looked for {} in {})",
        POLICY_CANDIDATES.join(" or "),
        searched.join(", ")
    );
}

/// Checks whether a `Cargo.toml` file defines a `[workspace]` section
/// by parsing as TOML, avoiding false positives from comments or strings.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table.contains_key("workspace")
}

fn manifest_dir() -> PathBuf {
    std::env::var("CARGO_MANIFEST_DIR").map_or_else(
        |_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        PathBuf::from,
    )
}

/// Walks up from the crate directory to the workspace root.
///
/// Falls back to the crate directory for single-crate projects.
fn find_workspace_root(manifest_dir: &Path) -> PathBuf {
    manifest_dir
        .ancestors()
        .find(|dir| has_workspace_section(&dir.join("Cargo.toml")))
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "# [workspace] in a comment\n[workspace]\nmembers = [\"crates/app\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("crates/app")).unwrap();
        fs::write(
            dir.path().join("crates/app/Cargo.toml"),
            "[package]\nname = \"app\"\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn workspace_root_is_found_above_member() {
        let dir = layout();
        let member = dir.path().join("crates/app");
        assert_eq!(find_workspace_root(&member), dir.path());
    }

    #[test]
    fn standalone_crate_is_its_own_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"solo\"\n").unwrap();
        assert_eq!(find_workspace_root(dir.path()), dir.path());
    }

    #[test]
    fn workspace_key_in_comment_does_not_count() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("Cargo.toml");
        fs::write(&manifest, "# [workspace]\n[package]\nname = \"solo\"\n").unwrap();
        assert!(!has_workspace_section(&manifest));
    }

    #[test]
    fn crate_policy_wins_over_workspace_policy() {
        let dir = layout();
        let member = dir.path().join("crates/app");
        fs::write(dir.path().join(".bound-lint.toml"), "").unwrap();
        assert_eq!(
            locate_policy(&member, dir.path(), None),
            dir.path().join(".bound-lint.toml")
        );

        fs::write(member.join("bound-lint.toml"), "").unwrap();
        assert_eq!(
            locate_policy(&member, dir.path(), None),
            member.join("bound-lint.toml")
        );
    }

    #[test]
    fn explicit_policy_is_relative_to_workspace() {
        let dir = layout();
        let member = dir.path().join("crates/app");
        fs::create_dir_all(dir.path().join("ci")).unwrap();
        fs::write(dir.path().join("ci/policy.toml"), "").unwrap();
        assert_eq!(
            locate_policy(&member, dir.path(), Some("ci/policy.toml")),
            dir.path().join("ci/policy.toml")
        );
    }

    #[test]
    #[should_panic(expected = "policy file not found")]
    fn missing_explicit_policy_panics() {
        let dir = layout();
        locate_policy(dir.path(), dir.path(), Some("nope.toml"));
    }

    #[test]
    #[should_panic(expected = "no policy file found")]
    fn missing_policy_panics() {
        let dir = layout();
        locate_policy(&dir.path().join("crates/app"), dir.path(), None);
    }
}
