//! JavaScript and TypeScript import extraction.
//!
//! Recognizes ES `import` declarations (including side-effect imports and
//! `import x = require(...)`), `export ... from` re-exports, and CommonJS
//! `require(...)` calls. Dynamic `import()` is not a static dependency and
//! is skipped.

use super::lexer::{tokenize, LexerConfig, Token, TokenKind};
use super::{Dialect, DialectExtractor, ImportForm, ModulePath, ParseFailure, RawImport};
use crate::utils::paths::strip_source_extension;

const CONFIG: LexerConfig = LexerConfig {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    triple_quotes: false,
    backtick_strings: true,
    newlines: false,
};

/// Extracts module specifiers from JavaScript and TypeScript source.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcmaScriptExtractor;

impl DialectExtractor for EcmaScriptExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::EcmaScript
    }

    fn parse_imports(&self, source: &str) -> Result<Vec<RawImport>, ParseFailure> {
        let tokens = tokenize(source, CONFIG)?;
        let mut imports = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            let after_dot = i > 0 && tokens[i - 1].is_punct('.');

            if token.is_ident("import") && !after_dot {
                let next = tokens.get(i + 1);
                if next.is_some_and(|t| t.is_punct('(') || t.is_punct(':') || t.is_punct('.')) {
                    // `import(...)`, `import.meta`, or an object key.
                    i += 1;
                    continue;
                }
                let (specifier, end) = import_declaration(&tokens, i)?;
                imports.push(specifier_import(token.line, &specifier));
                i = end;
            } else if token.is_ident("export") && !after_dot {
                if let Some((specifier, end)) = reexport(&tokens, i)? {
                    imports.push(specifier_import(token.line, &specifier));
                    i = end;
                } else {
                    i += 1;
                }
            } else if token.is_ident("require") && !after_dot {
                if let Some(specifier) = require_call(&tokens, i) {
                    imports.push(specifier_import(token.line, &specifier));
                    i += 4;
                } else {
                    i += 1;
                }
            } else {
                i += 1;
            }
        }

        Ok(imports)
    }
}

/// Parses an `import` declaration starting at `start`. Returns the module
/// specifier and the index after it.
fn import_declaration(tokens: &[Token], start: usize) -> Result<(String, usize), ParseFailure> {
    let line = tokens[start].line;
    let mut i = start + 1;

    // import 'side-effect';
    if let Some(TokenKind::Str(s)) = tokens.get(i).map(|t| &t.kind) {
        return Ok((s.clone(), i + 1));
    }

    loop {
        let Some(token) = tokens.get(i) else {
            return Err(ParseFailure::new(line, "unterminated import declaration"));
        };
        match &token.kind {
            TokenKind::Ident(word) if word == "from" => {
                if let Some(TokenKind::Str(s)) = tokens.get(i + 1).map(|t| &t.kind) {
                    return Ok((s.clone(), i + 2));
                }
                // `from` may also be a binding name: `import { from } from 'x'`.
                i += 1;
            }
            TokenKind::Ident(_) => i += 1,
            TokenKind::Punct('{' | '}' | ',' | '*') => i += 1,
            TokenKind::Punct('=') => {
                // import fs = require('fs');
                if let Some(specifier) = tokens
                    .get(i + 1)
                    .filter(|t| t.is_ident("require"))
                    .and_then(|_| require_call(tokens, i + 1))
                {
                    return Ok((specifier, i + 5));
                }
                return Err(ParseFailure::new(
                    token.line,
                    "expected `require(...)` after `=` in import declaration",
                ));
            }
            TokenKind::Str(_) => {
                return Err(ParseFailure::new(
                    token.line,
                    "expected `from` before module specifier",
                ));
            }
            TokenKind::Punct(c) => {
                return Err(ParseFailure::new(
                    token.line,
                    format!("unexpected `{c}` in import declaration"),
                ));
            }
            TokenKind::Newline => i += 1,
        }
    }
}

/// Parses `export * [as ns] from 'x'` and `export { a, b as c } from 'x'`.
/// Any other `export` is not an import.
fn reexport(tokens: &[Token], start: usize) -> Result<Option<(String, usize)>, ParseFailure> {
    let mut i = start + 1;
    if tokens.get(i).is_some_and(|t| t.is_ident("type")) {
        i += 1;
    }

    match tokens.get(i) {
        Some(t) if t.is_punct('*') => {
            i += 1;
            if tokens.get(i).is_some_and(|t| t.is_ident("as")) {
                i += 2;
            }
        }
        Some(t) if t.is_punct('{') => {
            i += 1;
            while let Some(t) = tokens.get(i) {
                i += 1;
                if t.is_punct('}') {
                    break;
                }
            }
        }
        _ => return Ok(None),
    }

    if !tokens.get(i).is_some_and(|t| t.is_ident("from")) {
        return Ok(None);
    }
    match tokens.get(i + 1).map(|t| &t.kind) {
        Some(TokenKind::Str(s)) => Ok(Some((s.clone(), i + 2))),
        _ => Err(ParseFailure::new(
            tokens[i].line,
            "expected module specifier after `from`",
        )),
    }
}

/// Matches `require ( 'x' )` at `start`.
fn require_call(tokens: &[Token], start: usize) -> Option<String> {
    let open = tokens.get(start + 1)?;
    let arg = tokens.get(start + 2)?;
    let close = tokens.get(start + 3)?;
    match &arg.kind {
        TokenKind::Str(s) if open.is_punct('(') && close.is_punct(')') => Some(s.clone()),
        _ => None,
    }
}

/// Turns a module specifier into a raw import.
///
/// `./x` and `../x` are relative (level 1 plus one per `../`); everything
/// else is a package or path-alias specifier split on `/`.
fn specifier_import(line: usize, specifier: &str) -> RawImport {
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
        let mut level = 1;
        let mut segments = Vec::new();
        for part in specifier.split('/') {
            match part {
                "" | "." => {}
                ".." if segments.is_empty() => level += 1,
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_string()),
            }
        }
        if let Some(last) = segments.last_mut() {
            *last = strip_source_extension(last).to_string();
        }
        return RawImport {
            line,
            raw: specifier.to_string(),
            form: ImportForm::Relative { level },
            module: ModulePath::new(segments),
            members: Vec::new(),
        };
    }

    let module: ModulePath = specifier.split('/').filter(|s| !s.is_empty()).collect();
    RawImport::absolute(line, specifier, module)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(src: &str) -> Vec<String> {
        EcmaScriptExtractor
            .parse_imports(src)
            .unwrap()
            .into_iter()
            .map(|i| i.raw)
            .collect()
    }

    #[test]
    fn every_es_import_shape() {
        let src = r#"
import React from 'react';
import { useState, useEffect as effect } from "react";
import * as fs from 'node:fs';
import type { Money } from '../shared/money';
import Default, { named } from './local';
import './polyfill';
"#;
        assert_eq!(
            raws(src),
            vec!["react", "react", "node:fs", "../shared/money", "./local", "./polyfill"]
        );
    }

    #[test]
    fn multiline_import_keeps_statement_line() {
        let imports = EcmaScriptExtractor
            .parse_imports("\nimport {\n  a,\n  b,\n} from 'pkg';\n")
            .unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].line, 2);
    }

    #[test]
    fn reexports_and_require() {
        let src = r#"
export * from './types';
export { Stock as InventoryStock } from '../inventory/stock';
export { localThing };
export const x = 1;
const pg = require('pg');
const cfg = config.require('not-a-module');
"#;
        assert_eq!(raws(src), vec!["./types", "../inventory/stock", "pg"]);
    }

    #[test]
    fn dynamic_import_and_import_meta_are_skipped() {
        let src = "const m = await import('./lazy');\nconsole.log(import.meta.url);\n";
        assert!(raws(src).is_empty());
    }

    #[test]
    fn ts_import_equals_require() {
        assert_eq!(raws("import fs = require('fs');\n"), vec!["fs"]);
    }

    #[test]
    fn relative_specifier_levels() {
        let imports = EcmaScriptExtractor
            .parse_imports("import a from './a.js';\nimport b from '../../shared/b';\n")
            .unwrap();
        assert_eq!(imports[0].form, ImportForm::Relative { level: 1 });
        assert_eq!(imports[0].module.to_string(), "a");
        assert_eq!(imports[1].form, ImportForm::Relative { level: 3 });
        assert_eq!(imports[1].module.to_string(), "shared.b");
    }

    #[test]
    fn scoped_package_is_absolute() {
        let imports = EcmaScriptExtractor
            .parse_imports("import { S3 } from '@aws-sdk/client-s3';")
            .unwrap();
        assert_eq!(imports[0].form, ImportForm::Absolute);
        assert_eq!(imports[0].module.segments(), ["@aws-sdk", "client-s3"]);
    }

    #[test]
    fn imports_in_comments_and_templates_are_ignored() {
        let src = "// import a from 'a';\n/* import b from 'b'; */\nconst s = `import c from 'c'`;\n";
        assert!(raws(src).is_empty());
    }

    #[test]
    fn malformed_declarations_fail() {
        assert!(EcmaScriptExtractor.parse_imports("import { a } 'x';").is_err());
        assert!(EcmaScriptExtractor.parse_imports("import { a } from").is_err());
        assert!(EcmaScriptExtractor.parse_imports("export * from ;").is_err());
    }
}
