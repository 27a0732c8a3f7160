//! Python import extraction.

use super::lexer::{tokenize, LexerConfig, Token, TokenKind};
use super::{Dialect, DialectExtractor, ImportForm, ModulePath, ParseFailure, RawImport};

const CONFIG: LexerConfig = LexerConfig {
    line_comments: &["#"],
    block_comment: None,
    triple_quotes: true,
    backtick_strings: false,
    newlines: true,
};

/// Extracts `import` and `from ... import` statements from Python source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExtractor;

impl DialectExtractor for PythonExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Python
    }

    fn parse_imports(&self, source: &str) -> Result<Vec<RawImport>, ParseFailure> {
        let tokens = tokenize(source, CONFIG)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
        };
        let mut imports = Vec::new();

        while let Some(token) = parser.peek() {
            let at_statement_start = parser.pos == 0
                || parser.tokens.get(parser.pos - 1).is_some_and(|prev| {
                    prev.kind == TokenKind::Newline || prev.is_punct(';') || prev.is_punct(':')
                });

            if at_statement_start && token.is_ident("import") {
                parser.pos += 1;
                imports.extend(parser.import_statement(token.line)?);
            } else if at_statement_start && token.is_ident("from") {
                parser.pos += 1;
                imports.push(parser.from_statement(token.line)?);
            } else {
                parser.pos += 1;
            }
        }

        Ok(imports)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn line(&self, fallback: usize) -> usize {
        self.peek().map_or(fallback, |t| t.line)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_ident(word)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn name(&mut self, line: usize, what: &str) -> Result<String, ParseFailure> {
        match self.peek().and_then(Token::ident) {
            Some(name) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            None => Err(ParseFailure::new(self.line(line), format!("expected {what}"))),
        }
    }

    fn dotted_name(&mut self, line: usize) -> Result<Vec<String>, ParseFailure> {
        let mut segments = vec![self.name(line, "module name")?];
        while self.eat_punct('.') {
            segments.push(self.name(line, "module name after `.`")?);
        }
        Ok(segments)
    }

    fn skip_alias(&mut self, line: usize) -> Result<(), ParseFailure> {
        if self.eat_ident("as") {
            self.name(line, "alias after `as`")?;
        }
        Ok(())
    }

    fn end_of_statement(&mut self, line: usize) -> Result<(), ParseFailure> {
        match self.peek() {
            None => Ok(()),
            Some(t) if t.kind == TokenKind::Newline || t.is_punct(';') => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(ParseFailure::new(
                t.line,
                format!("unexpected {} in import statement starting on line {line}", describe(t)),
            )),
        }
    }

    /// `import a.b [as c], d`
    fn import_statement(&mut self, line: usize) -> Result<Vec<RawImport>, ParseFailure> {
        let mut imports = Vec::new();
        loop {
            let segments = self.dotted_name(line)?;
            self.skip_alias(line)?;
            imports.push(RawImport::absolute(
                line,
                segments.join("."),
                segments.into_iter().collect(),
            ));
            if !self.eat_punct(',') {
                break;
            }
        }
        self.end_of_statement(line)?;
        Ok(imports)
    }

    /// `from [.]*[a.b] import x [as y], z` or `import (x, y)` or `import *`
    fn from_statement(&mut self, line: usize) -> Result<RawImport, ParseFailure> {
        let mut level = 0;
        while self.eat_punct('.') {
            level += 1;
        }

        let segments = if self.peek().is_some_and(|t| t.is_ident("import")) {
            if level == 0 {
                return Err(ParseFailure::new(line, "expected module name after `from`"));
            }
            Vec::new()
        } else {
            self.dotted_name(line)?
        };

        if !self.eat_ident("import") {
            return Err(ParseFailure::new(self.line(line), "expected `import` after module name"));
        }

        let mut members = Vec::new();
        if !self.eat_punct('*') {
            let parenthesized = self.eat_punct('(');
            loop {
                if parenthesized && self.peek().is_some_and(|t| t.is_punct(')')) {
                    break;
                }
                let name = self.name(line, "imported name")?;
                self.skip_alias(line)?;
                members.push(ModulePath::new(vec![name]));
                if !self.eat_punct(',') {
                    break;
                }
            }
            if parenthesized && !self.eat_punct(')') {
                return Err(ParseFailure::new(self.line(line), "expected `)` to close import list"));
            }
            if members.is_empty() {
                return Err(ParseFailure::new(line, "empty import list"));
            }
        }
        self.end_of_statement(line)?;

        let raw = format!("{}{}", ".".repeat(level), segments.join("."));
        let form = if level == 0 {
            ImportForm::Absolute
        } else {
            ImportForm::Relative { level }
        };

        Ok(RawImport {
            line,
            raw,
            form,
            module: segments.into_iter().collect(),
            members,
        })
    }
}

fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Ident(s) => format!("`{s}`"),
        TokenKind::Str(_) => "string literal".to_string(),
        TokenKind::Punct(c) => format!("`{c}`"),
        TokenKind::Newline => "end of line".to_string(),
    }
}
