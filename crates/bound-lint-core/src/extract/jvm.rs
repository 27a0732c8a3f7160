//! Kotlin, Java and Scala import extraction.

use super::lexer::{tokenize, LexerConfig, Token, TokenKind};
use super::{Dialect, DialectExtractor, ModulePath, ParseFailure, RawImport};

const CONFIG: LexerConfig = LexerConfig {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    triple_quotes: true,
    backtick_strings: true,
    newlines: true,
};

/// Extracts `import` directives from JVM-language source.
///
/// Handles `import a.b.C`, `import a.b.*`, `import static a.B.c`,
/// Kotlin aliases (`import a.B as C`) and Scala selectors
/// (`import a.b.{C, D => E}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JvmExtractor;

impl DialectExtractor for JvmExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Jvm
    }

    fn parse_imports(&self, source: &str) -> Result<Vec<RawImport>, ParseFailure> {
        let tokens = tokenize(source, CONFIG)?;
        let mut imports = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let at_line_start = i == 0
                || tokens[i - 1].kind == TokenKind::Newline
                || tokens[i - 1].is_punct(';');
            if at_line_start && tokens[i].is_ident("import") {
                let (import, end) = directive(&tokens, i)?;
                imports.push(import);
                i = end;
            } else {
                i += 1;
            }
        }

        Ok(imports)
    }
}

fn directive(tokens: &[Token], start: usize) -> Result<(RawImport, usize), ParseFailure> {
    let line = tokens[start].line;
    let mut i = start + 1;
    if tokens.get(i).is_some_and(|t| t.is_ident("static")) {
        i += 1;
    }

    let mut segments = Vec::new();
    let mut members = Vec::new();
    loop {
        match tokens.get(i).map(|t| &t.kind) {
            // Wildcard imports reference the package itself.
            Some(TokenKind::Ident(name)) if name == "_" && !segments.is_empty() => {
                i += 1;
                break;
            }
            Some(TokenKind::Punct('*')) if !segments.is_empty() => {
                i += 1;
                break;
            }
            Some(TokenKind::Ident(name)) => segments.push(name.clone()),
            Some(TokenKind::Punct('{')) if !segments.is_empty() => {
                let (selected, end) = selectors(tokens, i + 1, line)?;
                members = selected;
                i = end;
                break;
            }
            _ => {
                return Err(ParseFailure::new(
                    tokens.get(i).map_or(line, |t| t.line),
                    "expected qualified name in import",
                ));
            }
        }
        i += 1;
        if tokens.get(i).is_some_and(|t| t.is_punct('.')) {
            i += 1;
        } else {
            break;
        }
    }

    if tokens.get(i).is_some_and(|t| t.is_ident("as")) {
        if tokens.get(i + 1).and_then(Token::ident).is_none() {
            return Err(ParseFailure::new(line, "expected alias after `as`"));
        }
        i += 2;
    }

    match tokens.get(i) {
        None => {}
        Some(t) if t.kind == TokenKind::Newline || t.is_punct(';') => i += 1,
        Some(t) => {
            return Err(ParseFailure::new(t.line, "unexpected token after import"));
        }
    }

    let raw = segments.join(".");
    let import = RawImport::absolute(line, raw, ModulePath::new(segments)).with_members(members);
    Ok((import, i))
}

/// Parses a Scala selector list after `{` up to the closing `}`.
fn selectors(
    tokens: &[Token],
    mut i: usize,
    line: usize,
) -> Result<(Vec<ModulePath>, usize), ParseFailure> {
    let mut members = Vec::new();
    loop {
        let Some(token) = tokens.get(i) else {
            return Err(ParseFailure::new(line, "unterminated import selector"));
        };
        match &token.kind {
            TokenKind::Punct('}') => return Ok((members, i + 1)),
            TokenKind::Ident(name) if name == "_" => i += 1,
            TokenKind::Ident(name) => {
                members.push(ModulePath::new(vec![name.clone()]));
                i += 1;
                // `A => B` renames; `A => _` hides. Either way skip the target.
                if tokens.get(i).is_some_and(|t| t.is_punct('='))
                    && tokens.get(i + 1).is_some_and(|t| t.is_punct('>'))
                {
                    i += 3;
                }
            }
            TokenKind::Punct(',') => i += 1,
            _ => return Err(ParseFailure::new(token.line, "unexpected token in import selector")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(src: &str) -> Vec<String> {
        JvmExtractor
            .parse_imports(src)
            .unwrap()
            .into_iter()
            .map(|i| i.module.to_string())
            .collect()
    }

    #[test]
    fn kotlin_imports() {
        let src = "package com.acme.payments\n\nimport com.acme.shared.Money\nimport com.acme.inventory.*\nimport java.sql.Connection as Conn\n\nclass Api\n";
        assert_eq!(
            modules(src),
            vec!["com.acme.shared.Money", "com.acme.inventory", "java.sql.Connection"]
        );
    }

    #[test]
    fn java_static_imports_with_semicolons() {
        let src = "package a;\nimport static org.junit.Assert.assertEquals;\nimport java.util.List;\n";
        assert_eq!(
            modules(src),
            vec!["org.junit.Assert.assertEquals", "java.util.List"]
        );
    }

    #[test]
    fn scala_selectors_become_members() {
        let imports = JvmExtractor
            .parse_imports("import acme.shared.{Money, Currency => Ccy}\n")
            .unwrap();
        assert_eq!(imports[0].module.to_string(), "acme.shared");
        let members: Vec<String> = imports[0].members.iter().map(ToString::to_string).collect();
        assert_eq!(members, vec!["Money", "Currency"]);
    }

    #[test]
    fn scala_underscore_wildcard() {
        assert_eq!(modules("import acme.inventory._\n"), vec!["acme.inventory"]);
    }

    #[test]
    fn import_words_inside_code_are_ignored() {
        let src = "fun f() {\n  val s = \"import a.b\"\n  // import c.d\n}\n";
        assert!(modules(src).is_empty());
    }

    #[test]
    fn malformed_import_fails() {
        let err = JvmExtractor.parse_imports("import\nclass A\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(JvmExtractor.parse_imports("import a.b c\n").is_err());
    }
}
