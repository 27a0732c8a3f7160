//! A small tolerant tokenizer shared by the text-based dialects.
//!
//! It only needs to be good enough to find import statements: identifiers,
//! string literals, punctuation and (for line-oriented dialects) logical
//! newlines. Comments and string contents never surface as identifiers.

use super::ParseFailure;

/// Lexical conventions of a dialect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LexerConfig {
    /// Line comment introducers (`#`, `//`).
    pub line_comments: &'static [&'static str],
    /// Block comment delimiters (`/*`, `*/`).
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Python-style `'''`/`"""` strings.
    pub triple_quotes: bool,
    /// JavaScript template literals.
    pub backtick_strings: bool,
    /// Emit [`TokenKind::Newline`] at logical line ends (outside brackets,
    /// after backslash continuations are joined).
    pub newlines: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Punct(char),
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub(crate) fn is_ident(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == word)
    }

    pub(crate) fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub(crate) fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tokenizes `source`.
///
/// Unterminated block comments, triple-quoted strings and template literals
/// are reported as failures. Ordinary quoted strings end at the line end so
/// that an odd quote (a regex literal, a char in a comment we failed to
/// recognise) cannot swallow the rest of the file.
pub(crate) fn tokenize(source: &str, config: LexerConfig) -> Result<Vec<Token>, ParseFailure> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut depth: usize = 0;
    let mut i = 0;

    let starts_with = |i: usize, s: &str| {
        let mut j = i;
        for c in s.chars() {
            if chars.get(j) != Some(&c) {
                return false;
            }
            j += 1;
        }
        true
    };

    'outer: while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            if config.newlines && depth == 0 {
                push_newline(&mut tokens, line);
            }
            line += 1;
            i += 1;
            continue;
        }

        if c == '\\' && config.newlines {
            // Line continuation: `\` followed by optional `\r` and `\n`.
            let mut j = i + 1;
            if chars.get(j) == Some(&'\r') {
                j += 1;
            }
            if chars.get(j) == Some(&'\n') {
                line += 1;
                i = j + 1;
                continue;
            }
            tokens.push(Token {
                kind: TokenKind::Punct(c),
                line,
            });
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        for intro in config.line_comments {
            if starts_with(i, intro) {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue 'outer;
            }
        }

        if let Some((open, close)) = config.block_comment {
            if starts_with(i, open) {
                let start_line = line;
                i += open.chars().count();
                loop {
                    if i >= chars.len() {
                        return Err(ParseFailure::new(start_line, "unterminated block comment"));
                    }
                    if starts_with(i, close) {
                        i += close.chars().count();
                        break;
                    }
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                continue;
            }
        }

        if c == '"' || c == '\'' || (c == '`' && config.backtick_strings) {
            let start_line = line;
            let triple = config.triple_quotes
                && chars.get(i + 1) == Some(&c)
                && chars.get(i + 2) == Some(&c);
            let multiline = triple || c == '`';
            i += if triple { 3 } else { 1 };

            let mut text = String::new();
            loop {
                let Some(&ch) = chars.get(i) else {
                    if multiline {
                        return Err(ParseFailure::new(start_line, "unterminated string literal"));
                    }
                    break;
                };
                if ch == '\\' {
                    if let Some(&next) = chars.get(i + 1) {
                        if next == '\n' {
                            line += 1;
                        }
                        text.push(next);
                    }
                    i += 2;
                    continue;
                }
                if ch == '\n' {
                    if !multiline {
                        break;
                    }
                    line += 1;
                }
                if ch == c && (!triple || (chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c))) {
                    i += if triple { 3 } else { 1 };
                    break;
                }
                text.push(ch);
                i += 1;
            }

            tokens.push(Token {
                kind: TokenKind::Str(text),
                line: start_line,
            });
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            i += 1;
            while i < chars.len() && is_ident_continue(chars[i]) {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                line,
            });
            continue;
        }

        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        tokens.push(Token {
            kind: TokenKind::Punct(c),
            line,
        });
        i += 1;
    }

    if config.newlines {
        push_newline(&mut tokens, line);
    }
    Ok(tokens)
}

fn push_newline(tokens: &mut Vec<Token>, line: usize) {
    if tokens.last().is_some_and(|t| t.kind != TokenKind::Newline) {
        tokens.push(Token {
            kind: TokenKind::Newline,
            line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PY: LexerConfig = LexerConfig {
        line_comments: &["#"],
        block_comment: None,
        triple_quotes: true,
        backtick_strings: false,
        newlines: true,
    };

    const JS: LexerConfig = LexerConfig {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        triple_quotes: false,
        backtick_strings: true,
        newlines: false,
    };

    fn idents(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().filter_map(Token::ident).collect()
    }

    #[test]
    fn comments_and_strings_hide_identifiers() {
        let tokens = tokenize("# import os\nx = \"import sys\"\n", PY).unwrap();
        assert_eq!(idents(&tokens), vec!["x"]);
    }

    #[test]
    fn triple_quoted_strings_span_lines() {
        let tokens = tokenize("'''\nimport os\n'''\nimport sys\n", PY).unwrap();
        assert_eq!(idents(&tokens), vec!["import", "sys"]);
        let import = tokens.iter().find(|t| t.is_ident("import")).unwrap();
        assert_eq!(import.line, 4);
    }

    #[test]
    fn brackets_suppress_newlines() {
        let tokens = tokenize("from a import (\n  b,\n  c,\n)\n", PY).unwrap();
        let newlines = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn backslash_joins_lines() {
        let tokens = tokenize("import a, \\\n  b\n", PY).unwrap();
        let newlines = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .count();
        assert_eq!(newlines, 1);
        assert_eq!(idents(&tokens), vec!["import", "a", "b"]);
    }

    #[test]
    fn block_comments_are_skipped() {
        let tokens = tokenize("/* import x from 'y' */ import z from 'w';", JS).unwrap();
        assert_eq!(idents(&tokens), vec!["import", "z", "from"]);
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let err = tokenize("import a from 'b';\n/* never closed", JS).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unterminated_triple_quote_fails() {
        assert!(tokenize("x = '''\nimport os\n", PY).is_err());
    }

    #[test]
    fn scoped_package_names_survive_as_strings() {
        let tokens = tokenize("import { S3 } from '@aws-sdk/client-s3';", JS).unwrap();
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Str("@aws-sdk/client-s3".into())));
    }
}
