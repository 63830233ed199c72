//! Minimal M lexer used to rewrite snippet bodies.
//!
//! This is not a parser. It only knows enough of the lexical grammar to find
//! identifier boundaries: text literals (with `""` escapes), quoted
//! identifiers (`#"..."`), line and block comments, numbers and dotted
//! identifiers such as `Table.SelectRows`. Everything else is punctuation.

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    /// `#"..."`
    QuotedIdentifier,
    Text,
    Number,
    Comment,
    Whitespace,
    Symbol,
}

/// A token as a byte range into the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn position(chars: &mut Chars<'_>, len: usize) -> usize {
    chars.peek().map_or(len, |(i, _)| *i)
}

/// Consume a text literal body after the opening quote
fn skip_text(chars: &mut Chars<'_>) {
    while let Some((_, ch)) = chars.next() {
        if ch == '"' {
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                continue;
            }
            return;
        }
    }
}

fn skip_line_comment(chars: &mut Chars<'_>) {
    while let Some((_, ch)) = chars.peek() {
        if *ch == '\n' {
            return;
        }
        chars.next();
    }
}

fn skip_block_comment(chars: &mut Chars<'_>) {
    let mut prev = '\0';
    for (_, ch) in chars.by_ref() {
        if prev == '*' && ch == '/' {
            return;
        }
        prev = ch;
    }
}

/// Identifiers may be dotted (`Table.AddColumn`, `Int64.Type`)
fn skip_identifier(source: &str, chars: &mut Chars<'_>) {
    loop {
        match chars.peek().copied() {
            Some((_, ch)) if is_identifier_part(ch) => {
                chars.next();
            }
            Some((i, '.')) => {
                let next = source[i + 1..].chars().next();
                if next.is_some_and(is_identifier_start) {
                    chars.next();
                } else {
                    return;
                }
            }
            _ => return,
        }
    }
}

/// Split `source` into tokens covering every byte
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    let len = source.len();

    while let Some((start, ch)) = chars.next() {
        let kind = if ch.is_whitespace() {
            while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                chars.next();
            }
            TokenKind::Whitespace
        } else if ch == '/' && matches!(chars.peek(), Some((_, '/'))) {
            skip_line_comment(&mut chars);
            TokenKind::Comment
        } else if ch == '/' && matches!(chars.peek(), Some((_, '*'))) {
            chars.next();
            skip_block_comment(&mut chars);
            TokenKind::Comment
        } else if ch == '"' {
            skip_text(&mut chars);
            TokenKind::Text
        } else if ch == '#' && matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            skip_text(&mut chars);
            TokenKind::QuotedIdentifier
        } else if is_identifier_start(ch) {
            skip_identifier(source, &mut chars);
            TokenKind::Identifier
        } else if ch.is_ascii_digit() {
            while chars.peek().is_some_and(|(_, c)| c.is_ascii_alphanumeric() || *c == '.') {
                chars.next();
            }
            TokenKind::Number
        } else {
            TokenKind::Symbol
        };

        let end = position(&mut chars, len);
        tokens.push(Token { kind, span: start..end });
    }

    tokens
}

/// Name an identifier token refers to (`#"a b"` → `a b`)
fn identifier_name<'a>(source: &'a str, token: &Token) -> Option<std::borrow::Cow<'a, str>> {
    let text = &source[token.span.clone()];
    match token.kind {
        TokenKind::Identifier => Some(text.into()),
        TokenKind::QuotedIdentifier => {
            let inner = text.strip_prefix("#\"")?.strip_suffix('"')?;
            Some(inner.replace("\"\"", "\"").into())
        }
        _ => None,
    }
}

/// Replace whole-identifier references to `name` with `replacement`.
///
/// Text literals and comments are left alone, as are names directly after
/// `[` (field access and record field names). A field name after a comma
/// inside a record literal (`[a = 1, t = 2]`) is not recognised and will be
/// rewritten.
pub fn substitute_identifier(source: &str, name: &str, replacement: &str) -> String {
    let tokens = tokenize(source);
    let mut out = String::with_capacity(source.len());
    let mut prev_significant: Option<&str> = None;

    for token in &tokens {
        let text = &source[token.span.clone()];
        let after_bracket = prev_significant == Some("[");
        let is_match = !after_bracket
            && identifier_name(source, token).is_some_and(|ident| ident == name);

        if is_match {
            out.push_str(replacement);
        } else {
            out.push_str(text);
        }

        if !matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment) {
            prev_significant = Some(text);
        }
    }

    out
}

/// `source` without a `//` comment on its last line.
///
/// A line comment runs to the end of the line, so anything appended after
/// the source (a separator or a closing paren) would be commented out.
pub fn strip_trailing_line_comment(source: &str) -> &str {
    let tokens = tokenize(source);
    match tokens.iter().rev().find(|t| t.kind != TokenKind::Whitespace) {
        Some(last) if last.kind == TokenKind::Comment && source[last.span.clone()].starts_with("//") => {
            source[..last.span.start].trim_end()
        }
        _ => source,
    }
}

/// Escape text for an M text literal body.
///
/// `"` is doubled, `#(` is escaped as `#(#)(`, and carriage returns, line
/// feeds and tabs become `#(cr)`, `#(lf)` and `#(tab)`.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\"\""),
            '#' if chars.peek() == Some(&'(') => out.push_str("#(#)"),
            '\r' => out.push_str("#(cr)"),
            '\n' => out.push_str("#(lf)"),
            '\t' => out.push_str("#(tab)"),
            _ => out.push(ch),
        }
    }
    out
}

/// Quoted M text literal
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape_text(value))
}
