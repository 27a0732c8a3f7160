//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_POLICY: &str = r#"# bound-lint policy
# Contexts, who may depend on whom, and which libraries each may use.

[analyzer]
# Root directory to analyze, relative to this file (default: ".")
# root = "."

# Glob patterns to exclude. When empty, build/vendor/cache directories
# are skipped.
exclude = [
    "**/target/**",
    "**/vendor/**",
    "**/node_modules/**",
]

# Directories absolute imports resolve against, in order.
module_roots = ["src"]

# Each subdirectory of this directory is a context named after it.
contexts_root = "src"

respect_gitignore = true
# max_files = 50000
# timeout_secs = 120

[policy]
# Contexts without a [boundaries] entry: "deny-all" or "allow-all".
default_policy = "deny-all"
# Accept references to contexts that are not declared yet.
allow_forward_declared = false

# Explicit contexts take priority over contexts_root.
[[contexts]]
name = "shared"
paths = ["src/shared"]

[boundaries]
# context = [contexts it may depend on], or ["*"] for any.
shared = []
# payments = ["shared"]

[forbidden]
# context (or "global") = [external libraries it may not import]
# global = ["psycopg2"]
"#;

/// Policy file name written by `init`.
const POLICY_FILE: &str = "bound-lint.toml";

/// Runs the init command in `dir`.
///
/// # Errors
///
/// Returns an error if the policy exists and `force` is not set, or the
/// file cannot be written.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let policy_path = dir.join(POLICY_FILE);

    if policy_path.exists() && !force {
        bail!(
            "Policy file already exists at {}. Use --force to overwrite.",
            policy_path.display()
        );
    }

    std::fs::write(&policy_path, DEFAULT_POLICY)
        .with_context(|| format!("Failed to write {}", policy_path.display()))?;

    println!("Created {POLICY_FILE}");
    println!("\nNext steps:");
    println!("  1. Declare your contexts and boundaries in {POLICY_FILE}");
    println!("  2. Run: bound-lint contexts");
    println!("  3. Run: bound-lint check");

    Ok(())
}
