//! Lexical analyzer for JavaScript source text.
//!
//! Produces [`Token`]s for identifiers, keywords, numeric, string, template
//! and regular-expression literals, and punctuators. Comments and whitespace
//! are skipped, but each token records whether a line terminator was skipped
//! before it, which is what automatic semicolon insertion depends on.
//!
//! A `/` starts a regular expression when the previous significant token
//! cannot end an expression, and is division otherwise. Errors are reported
//! to the [`DiagnosticSink`] with code [`SYNTAX_ERROR`] and produce
//! [`JsToken::Error`] tokens.

use crate::token::{is_keyword, is_value_keyword, JsToken, Token};
use kiln_diagnostics::code::{Category, DiagnosticCode};
use kiln_diagnostics::{Diagnostic, DiagnosticSink};
use kiln_source::{FileId, Span};

/// Code of every diagnostic raised for text that is not valid JavaScript.
pub const SYNTAX_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);

/// Longest first, so that the first prefix match is the maximal munch.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

/// Lexes JavaScript source into tokens.
///
/// The returned vector always ends with a [`JsToken::Eof`] token.
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        text: source,
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
        newline: false,
        last: None,
        parens: Vec::new(),
        header_closed: false,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    text: &'a str,
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
    newline: bool,
    last: Option<Token>,
    /// One entry per open `(`: whether it starts an `if`/`while`/`for`/`with` header.
    parens: Vec<bool>,
    header_closed: bool,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        if self.source.starts_with(b"#!") {
            self.skip_line();
        }
        loop {
            self.skip_trivia();
            if self.at_end() {
                tokens.push(Token {
                    kind: JsToken::Eof,
                    span: Span::new(self.file, self.pos as u32, self.pos as u32),
                    newline_before: self.newline,
                });
                break;
            }
            let tok = self.next_token();
            tokens.push(tok);
            self.track_parens(tok);
            self.last = Some(tok);
            self.newline = false;
        }
        tokens
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn token(&self, kind: JsToken, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
            newline_before: self.newline,
        }
    }

    fn error(&self, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(SYNTAX_ERROR, msg, span));
    }

    fn skip_line(&mut self) {
        while !self.at_end() && !matches!(self.peek(), b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    /// Length of the non-ASCII whitespace or line terminator at `pos`, and
    /// whether it is a line terminator.
    fn unicode_space(&self) -> Option<(usize, bool)> {
        match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (0xC2, 0xA0, _) => Some((2, false)),
            (0xEF, 0xBB, 0xBF) => Some((3, false)),
            (0xE2, 0x80, 0xA8 | 0xA9) => Some((3, true)),
            _ => None,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let b = self.peek();
            if matches!(b, b'\n' | b'\r') {
                self.newline = true;
                self.pos += 1;
                continue;
            }
            if matches!(b, b' ' | b'\t' | 0x0B | 0x0C) {
                self.pos += 1;
                continue;
            }
            if let Some((len, is_newline)) = self.unicode_space() {
                self.newline |= is_newline;
                self.pos += len;
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'/' {
                self.skip_line();
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.at_end() {
                        self.error("unterminated block comment", self.span_from(start));
                        break;
                    }
                    if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    if matches!(self.peek(), b'\n' | b'\r') {
                        self.newline = true;
                    }
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if is_ident_start(b) {
            return self.lex_word(start);
        }
        if b == b'#' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            self.eat_ident_chars();
            return self.token(JsToken::Identifier, start);
        }
        if b.is_ascii_digit() || (b == b'.' && self.peek_at(1).is_ascii_digit()) {
            return self.lex_number(start);
        }
        if b == b'"' || b == b'\'' {
            return self.lex_string(start);
        }
        if b == b'`' {
            return self.lex_template(start);
        }
        if b == b'/' && self.regex_allowed() {
            return self.lex_regex(start);
        }
        self.lex_punct(start)
    }

    fn track_parens(&mut self, tok: Token) {
        if tok.kind != JsToken::Punct {
            return;
        }
        match tok.text(self.text) {
            "(" => {
                let control = self.last.is_some_and(|last| {
                    last.kind == JsToken::Keyword
                        && matches!(last.text(self.text), "if" | "while" | "for" | "with")
                });
                self.parens.push(control);
            }
            ")" => self.header_closed = self.parens.pop().unwrap_or(false),
            _ => {}
        }
    }

    fn regex_allowed(&self) -> bool {
        let Some(last) = self.last else {
            return true;
        };
        let text = last.text(self.text);
        match last.kind {
            JsToken::Identifier
            | JsToken::Number
            | JsToken::String
            | JsToken::Template
            | JsToken::Regex => false,
            JsToken::Keyword => !is_value_keyword(text),
            JsToken::Punct if text == ")" => self.header_closed,
            JsToken::Punct => !matches!(text, "]" | "++" | "--"),
            JsToken::Error | JsToken::Eof => true,
        }
    }

    fn eat_ident_chars(&mut self) {
        while !self.at_end() {
            let b = self.peek();
            if b == b'\\' {
                self.pos += 2;
            } else if is_ident_char(b) && self.unicode_space().is_none() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos = self.pos.min(self.source.len());
    }

    fn lex_word(&mut self, start: usize) -> Token {
        self.eat_ident_chars();
        let word = &self.text[start..self.pos];
        let kind = if is_keyword(word) {
            JsToken::Keyword
        } else {
            JsToken::Identifier
        };
        self.token(kind, start)
    }

    fn eat_digits(&mut self, radix: u32) {
        while !self.at_end() {
            let b = self.peek();
            if b == b'_' || (b as char).is_digit(radix) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        let radix = match (self.peek(), self.peek_at(1).to_ascii_lowercase()) {
            (b'0', b'x') => 16,
            (b'0', b'o') => 8,
            (b'0', b'b') => 2,
            _ => 10,
        };
        if radix != 10 {
            self.pos += 2;
            self.eat_digits(radix);
        } else {
            self.eat_digits(10);
            if self.peek() == b'.' {
                self.pos += 1;
                self.eat_digits(10);
            }
            if matches!(self.peek(), b'e' | b'E') {
                let sign = usize::from(matches!(self.peek_at(1), b'+' | b'-'));
                if self.peek_at(1 + sign).is_ascii_digit() {
                    self.pos += 1 + sign;
                    self.eat_digits(10);
                }
            }
        }
        if self.peek() == b'n' {
            self.pos += 1;
        }
        self.token(JsToken::Number, start)
    }

    /// Scans a quoted string starting at the opening quote. Returns `false`
    /// if the string is not closed on its line.
    fn scan_string(&mut self) -> bool {
        let quote = self.peek();
        self.pos += 1;
        loop {
            match self.peek() {
                _ if self.at_end() => return false,
                b'\n' | b'\r' => return false,
                b'\\' => {
                    self.pos += if self.peek_at(1) == b'\r' && self.peek_at(2) == b'\n' {
                        3
                    } else {
                        2
                    };
                    self.pos = self.pos.min(self.source.len());
                }
                b if b == quote => {
                    self.pos += 1;
                    return true;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scans a template literal starting at its backtick, including nested
    /// substitutions. Returns `false` on end of input.
    fn scan_template(&mut self) -> bool {
        self.pos += 1;
        loop {
            if self.at_end() {
                return false;
            }
            match self.peek() {
                b'`' => {
                    self.pos += 1;
                    return true;
                }
                b'\\' => self.pos = (self.pos + 2).min(self.source.len()),
                b'$' if self.peek_at(1) == b'{' => {
                    self.pos += 2;
                    if !self.scan_substitution() {
                        return false;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_substitution(&mut self) -> bool {
        let mut depth = 1usize;
        while !self.at_end() {
            match self.peek() {
                b'"' | b'\'' => {
                    if !self.scan_string() {
                        return false;
                    }
                }
                b'`' => {
                    if !self.scan_template() {
                        return false;
                    }
                }
                b'/' if self.peek_at(1) == b'/' => self.skip_line(),
                b'/' if self.peek_at(1) == b'*' => {
                    self.pos += 2;
                    while !self.at_end() && !(self.peek() == b'*' && self.peek_at(1) == b'/') {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.source.len());
                }
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => self.pos += 1,
            }
        }
        false
    }

    fn lex_string(&mut self, start: usize) -> Token {
        if self.scan_string() {
            self.token(JsToken::String, start)
        } else {
            self.error("unterminated string literal", self.span_from(start));
            self.token(JsToken::Error, start)
        }
    }

    fn lex_template(&mut self, start: usize) -> Token {
        if self.scan_template() {
            self.token(JsToken::Template, start)
        } else {
            self.error("unterminated template literal", self.span_from(start));
            self.token(JsToken::Error, start)
        }
    }

    fn lex_regex(&mut self, start: usize) -> Token {
        self.pos += 1;
        let mut in_class = false;
        loop {
            if self.at_end() || matches!(self.peek(), b'\n' | b'\r') {
                self.error(
                    "unterminated regular expression literal",
                    self.span_from(start),
                );
                return self.token(JsToken::Error, start);
            }
            match self.peek() {
                b'\\' if !matches!(self.peek_at(1), b'\n' | b'\r' | 0) => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.eat_ident_chars();
        self.token(JsToken::Regex, start)
    }

    fn lex_punct(&mut self, start: usize) -> Token {
        let rest = &self.source[self.pos..];
        let matched = PUNCTUATORS
            .iter()
            .find(|p| rest.starts_with(p.as_bytes()))
            .map(|p| {
                if *p == "?." && self.peek_at(2).is_ascii_digit() {
                    1
                } else {
                    p.len()
                }
            });
        match matched {
            Some(len) => {
                self.pos += len;
                self.token(JsToken::Punct, start)
            }
            None => {
                self.pos += 1;
                while !self.at_end() && (self.peek() & 0xC0) == 0x80 {
                    self.pos += 1;
                }
                let span = self.span_from(start);
                self.error(
                    &format!("unexpected character '{}'", &self.text[start..self.pos]),
                    span,
                );
                self.token(JsToken::Error, start)
            }
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'\\' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
