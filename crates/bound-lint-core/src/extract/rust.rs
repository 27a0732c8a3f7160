//! Rust import extraction via `syn`.

use std::path::Path;

use syn::visit::Visit;

use super::{Dialect, DialectExtractor, ImportForm, ModulePath, ParseFailure, RawImport};
use crate::utils::paths::path_segments;

/// Extracts `use` trees and `extern crate` items from Rust source.
///
/// `crate::` paths are absolute (resolved against the module roots);
/// `self::` and `super::` are relative to the enclosing module. Inline
/// `mod` blocks are tracked, so `use super::*` inside `mod tests { .. }`
/// refers to the file itself and `use self::x` inside `mod inner { .. }`
/// refers to `inner::x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustExtractor;

impl DialectExtractor for RustExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Rust
    }

    fn parse_imports(&self, source: &str) -> Result<Vec<RawImport>, ParseFailure> {
        let ast = syn::parse_file(source)
            .map_err(|e| ParseFailure::new(e.span().start().line.max(1), e.to_string()))?;

        let mut visitor = UseVisitor {
            inline_mods: Vec::new(),
            imports: Vec::new(),
        };
        visitor.visit_file(&ast);
        Ok(visitor.imports)
    }

    /// Level 0 is the file's own module, each further level one module up.
    /// `mod.rs`, `lib.rs` and `main.rs` own their directory.
    fn resolve_relative(&self, file: &Path, level: usize, module: &ModulePath) -> Option<ModulePath> {
        let mut base = path_segments(file);
        if let Some(last) = base.pop() {
            let stem = last.strip_suffix(".rs").unwrap_or(&last).to_string();
            if !matches!(stem.as_str(), "mod" | "lib" | "main") {
                base.push(stem);
            }
        }
        if level > base.len() {
            return None;
        }
        base.truncate(base.len() - level);
        Some(ModulePath::new(base).join(module))
    }
}

struct UseVisitor {
    /// Names of the inline modules enclosing the current item.
    inline_mods: Vec<String>,
    imports: Vec<RawImport>,
}

impl<'ast> Visit<'ast> for UseVisitor {
    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_some() {
            self.inline_mods.push(node.ident.to_string());
            syn::visit::visit_item_mod(self, node);
            self.inline_mods.pop();
        }
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        let line = node.use_token.span.start().line;
        for tree in top_level_trees(&node.tree) {
            if let Some(import) = self.import_for(line, tree) {
                self.imports.push(import);
            }
        }
    }

    fn visit_item_extern_crate(&mut self, node: &'ast syn::ItemExternCrate) {
        let name = node.ident.to_string();
        if name != "self" {
            let line = node.extern_token.span.start().line;
            self.imports
                .push(RawImport::absolute(line, name.clone(), ModulePath::new(vec![name])));
        }
    }
}

impl UseVisitor {
    fn import_for(&self, line: usize, tree: &syn::UseTree) -> Option<RawImport> {
        let (mut prefix, rest) = split_prefix(tree);
        let mut members = Vec::new();
        match rest {
            syn::UseTree::Name(n) if n.ident != "self" => prefix.push(n.ident.to_string()),
            syn::UseTree::Rename(r) if r.ident != "self" => prefix.push(r.ident.to_string()),
            syn::UseTree::Group(g) => {
                for item in &g.items {
                    members.extend(leaves(item, Vec::new()).into_iter().map(ModulePath::new));
                }
            }
            _ => {}
        }

        let raw = prefix.join("::");
        let (form, module) = match prefix.first().map(String::as_str) {
            Some("crate") => (ImportForm::Absolute, prefix[1..].to_vec()),
            Some("self") => self.relative(0, &prefix[1..]),
            Some("super") => {
                let supers = prefix.iter().take_while(|s| *s == "super").count();
                self.relative(supers, &prefix[supers..])
            }
            Some(_) => (ImportForm::Absolute, prefix),
            None => return None,
        };

        Some(RawImport {
            line,
            raw,
            form,
            module: ModulePath::new(module),
            members,
        })
    }

    /// Rebases a `self`/`super` path onto the file's module. Steps that stay
    /// inside the file keep the remaining inline module names as a prefix.
    fn relative(&self, supers: usize, rest: &[String]) -> (ImportForm, Vec<String>) {
        let depth = self.inline_mods.len();
        if supers > depth {
            return (ImportForm::Relative { level: supers - depth }, rest.to_vec());
        }
        let mut module = self.inline_mods[..depth - supers].to_vec();
        module.extend_from_slice(rest);
        (ImportForm::Relative { level: 0 }, module)
    }
}

/// `use {a::b, c};` is two imports.
fn top_level_trees(tree: &syn::UseTree) -> Vec<&syn::UseTree> {
    match tree {
        syn::UseTree::Group(g) => g.items.iter().flat_map(top_level_trees).collect(),
        other => vec![other],
    }
}

/// Walks `a::b::` path segments up to the first name, glob, or group.
fn split_prefix(tree: &syn::UseTree) -> (Vec<String>, &syn::UseTree) {
    let mut prefix = Vec::new();
    let mut current = tree;
    while let syn::UseTree::Path(p) = current {
        prefix.push(p.ident.to_string());
        current = &p.tree;
    }
    (prefix, current)
}

/// Flattens a group member into paths relative to the group's prefix.
/// Globs contribute nothing and `self` stands for the prefix itself.
fn leaves(tree: &syn::UseTree, prefix: Vec<String>) -> Vec<Vec<String>> {
    match tree {
        syn::UseTree::Path(p) => {
            let mut next = prefix;
            next.push(p.ident.to_string());
            leaves(&p.tree, next)
        }
        syn::UseTree::Name(n) if n.ident == "self" => non_empty(prefix),
        syn::UseTree::Rename(r) if r.ident == "self" => non_empty(prefix),
        syn::UseTree::Name(n) => {
            let mut path = prefix;
            path.push(n.ident.to_string());
            vec![path]
        }
        syn::UseTree::Rename(r) => {
            let mut path = prefix;
            path.push(r.ident.to_string());
            vec![path]
        }
        syn::UseTree::Glob(_) => non_empty(prefix),
        syn::UseTree::Group(g) => g
            .items
            .iter()
            .flat_map(|item| leaves(item, prefix.clone()))
            .collect(),
    }
}

fn non_empty(prefix: Vec<String>) -> Vec<Vec<String>> {
    if prefix.is_empty() {
        Vec::new()
    } else {
        vec![prefix]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<RawImport> {
        RustExtractor.parse_imports(src).unwrap()
    }

    fn members(import: &RawImport) -> Vec<String> {
        import.members.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn crate_paths_are_absolute() {
        let imports = parse("use crate::inventory::Stock;\n");
        assert_eq!(imports[0].form, ImportForm::Absolute);
        assert_eq!(imports[0].module.to_string(), "inventory.Stock");
        assert_eq!(imports[0].raw, "crate::inventory::Stock");
    }

    #[test]
    fn groups_become_members() {
        let imports = parse("use sqlx::{Pool, postgres::{PgPool, self}};\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module.to_string(), "sqlx");
        assert_eq!(
            members(&imports[0]),
            vec!["Pool", "postgres.PgPool", "postgres"]
        );
    }

    #[test]
    fn top_level_group_splits_into_imports() {
        let imports = parse("use {serde::Serialize, tokio};\n");
        let modules: Vec<String> = imports.iter().map(|i| i.module.to_string()).collect();
        assert_eq!(modules, vec!["serde.Serialize", "tokio"]);
    }

    #[test]
    fn super_and_self_are_relative() {
        let imports = parse("use super::super::shared::Money;\nuse self::models::Order;\n");
        assert_eq!(imports[0].form, ImportForm::Relative { level: 2 });
        assert_eq!(imports[0].module.to_string(), "shared.Money");
        assert_eq!(imports[1].form, ImportForm::Relative { level: 0 });
    }

    #[test]
    fn inline_modules_shift_relative_levels() {
        let src = "mod tests {\n    use super::*;\n    use super::super::other;\n}\n";
        let imports = parse(src);
        assert_eq!(imports[0].form, ImportForm::Relative { level: 0 });
        assert_eq!(imports[1].form, ImportForm::Relative { level: 1 });
    }

    #[test]
    fn inline_modules_prefix_self_paths() {
        let src = "mod outer {\n    mod inner {\n        use self::x::Y;\n        use super::z;\n    }\n    use self::w;\n}\n";
        let imports = parse(src);
        let rebased: Vec<(ImportForm, String)> = imports
            .iter()
            .map(|i| (i.form, i.module.to_string()))
            .collect();
        assert_eq!(
            rebased,
            vec![
                (ImportForm::Relative { level: 0 }, "outer.inner.x.Y".to_string()),
                (ImportForm::Relative { level: 0 }, "outer.z".to_string()),
                (ImportForm::Relative { level: 0 }, "outer.w".to_string()),
            ]
        );
    }

    #[test]
    fn nested_uses_and_extern_crate() {
        let src = "extern crate serde;\n\nfn f() {\n    use std::fs;\n}\n";
        let imports = parse(src);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].raw, "serde");
        assert_eq!(imports[1].line, 4);
    }

    #[test]
    fn glob_and_rename() {
        let imports = parse("use std::io::*;\nuse std::fmt::Result as FmtResult;\n");
        assert_eq!(imports[0].module.to_string(), "std.io");
        assert!(imports[0].members.is_empty());
        assert_eq!(imports[1].module.to_string(), "std.fmt.Result");
    }

    #[test]
    fn resolve_relative_against_module_files() {
        let module = ModulePath::new(vec!["shared".into()]);
        let resolved = RustExtractor
            .resolve_relative(Path::new("src/payments/api.rs"), 1, &module)
            .unwrap();
        assert_eq!(resolved.to_string(), "src.payments.shared");

        let resolved = RustExtractor
            .resolve_relative(Path::new("src/payments/mod.rs"), 1, &module)
            .unwrap();
        assert_eq!(resolved.to_string(), "src.shared");

        assert!(RustExtractor
            .resolve_relative(Path::new("lib.rs"), 1, &module)
            .is_none());
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = RustExtractor
            .parse_imports("use std::fs;\n\nstruct = 5;\n")
            .unwrap_err();
        assert_eq!(err.line, 3);
    }
}
