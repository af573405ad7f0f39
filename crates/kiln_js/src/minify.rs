//! Whitespace and comment removal.
//!
//! The minifier works on the token stream and never renames anything. Tokens
//! are re-emitted verbatim with the smallest separator that keeps the program
//! equivalent: nothing, a space where two tokens would otherwise fuse into
//! one, or a line break where dropping it could change where a semicolon is
//! automatically inserted.

use crate::balance::check_brackets;
use crate::lexer::lex;
use crate::token::{is_restricted_keyword, is_value_keyword, JsToken, Token};
use kiln_diagnostics::{Diagnostic, DiagnosticSink};
use kiln_source::FileId;

/// The source could not be minified because it is not valid JavaScript.
#[derive(Debug, thiserror::Error)]
#[error("{}", summary(.diagnostics))]
pub struct MinifyError {
    /// Every syntax problem found, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl MinifyError {
    /// Byte offset of the first problem.
    pub fn offset(&self) -> Option<u32> {
        self.diagnostics.first().map(|d| d.primary_span.start)
    }
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "invalid JavaScript".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

/// Minifies `source`. Spans in a returned error refer to `file`.
pub fn minify(source: &str, file: FileId) -> Result<String, MinifyError> {
    let sink = DiagnosticSink::new();
    let tokens = lex(source, file, &sink);
    check_brackets(&tokens, source, &sink);
    if sink.has_errors() {
        return Err(MinifyError {
            diagnostics: sink.take_all(),
        });
    }
    Ok(emit(&tokens, source))
}

fn emit(tokens: &[Token], source: &str) -> String {
    let tokens: Vec<&Token> = tokens.iter().filter(|t| t.kind != JsToken::Eof).collect();
    let header_ends = control_header_ends(&tokens, source);
    let mut out = String::with_capacity(source.len() / 2);
    let mut prev: Option<usize> = None;

    for (i, &tok) in tokens.iter().enumerate() {
        let next_closes_block = tokens
            .get(i + 1)
            .is_some_and(|n| n.is_punct(source, "}"));
        if tok.is_punct(source, ";") && next_closes_block {
            let empty_body = prev.map_or(true, |p| {
                header_ends[p]
                    || tokens[p].is_keyword(source, "else")
                    || tokens[p].is_keyword(source, "do")
            });
            if !empty_body {
                continue;
            }
        }
        if let Some(p) = prev {
            if needs_newline(tokens[p], tok, source) {
                let terminate = !header_ends[p] && starts_statement(tok, source);
                out.push(if terminate { ';' } else { '\n' });
            } else if needs_space(tokens[p], tok, source) {
                out.push(' ');
            }
        }
        out.push_str(tok.text(source));
        prev = Some(i);
    }
    out
}

/// Marks each `)` that closes the header of `if`, `while`, `for` or `with`.
/// A `;` after one of those is an empty statement body, not a terminator.
fn control_header_ends(tokens: &[&Token], source: &str) -> Vec<bool> {
    let mut ends = vec![false; tokens.len()];
    let mut open: Vec<bool> = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_punct(source, "(") {
            let control = i > 0
                && ["if", "while", "for", "with"]
                    .iter()
                    .any(|kw| tokens[i - 1].is_keyword(source, kw));
            open.push(control);
        } else if tok.is_punct(source, ")") {
            ends[i] = open.pop().unwrap_or(false);
        }
    }
    ends
}

fn needs_newline(prev: &Token, cur: &Token, source: &str) -> bool {
    if !cur.newline_before {
        return false;
    }
    let pt = prev.text(source);
    let ct = cur.text(source);

    if cur.kind == JsToken::Punct {
        // `a \n ++b` is two statements; `a \n { ... }` and `a \n !b` rely on
        // the inserted semicolon. Every other punctuator either continues the
        // expression or closes it.
        return matches!(ct, "++" | "--" | "{" | "!" | "~" | "..." | "#" | "@");
    }
    if prev.kind == JsToken::Keyword && is_restricted_keyword(pt) {
        return true;
    }
    if cur.kind == JsToken::Keyword && matches!(ct, "in" | "instanceof") {
        return false;
    }
    match prev.kind {
        JsToken::Punct => matches!(pt, ")" | "]" | "}" | "++" | "--"),
        JsToken::Keyword => is_value_keyword(pt),
        _ => true,
    }
}

/// Keywords that can only begin a statement, so a line break before them
/// is always a statement terminator. `while` is left out because it may
/// close a `do` loop.
fn starts_statement(tok: &Token, source: &str) -> bool {
    tok.kind == JsToken::Keyword
        && matches!(
            tok.text(source),
            "var" | "const" | "function" | "class" | "if" | "for" | "switch" | "try" | "do"
                | "return" | "throw" | "break" | "continue" | "debugger"
        )
}

fn needs_space(prev: &Token, cur: &Token, source: &str) -> bool {
    let pt = prev.text(source).as_bytes();
    let ct = cur.text(source).as_bytes();
    let (Some(&last), Some(&first)) = (pt.last(), ct.first()) else {
        return false;
    };

    let word_end = last.is_ascii_alphanumeric() || matches!(last, b'_' | b'$') || last >= 0x80;
    let word_start =
        first.is_ascii_alphanumeric() || matches!(first, b'_' | b'$' | b'\\' | b'#') || first >= 0x80;
    if word_end && word_start {
        return true;
    }
    if prev.kind == JsToken::Number {
        if word_start {
            return true;
        }
        // `1 .x` must not become `1.x`
        let plain_integer = pt.iter().all(|b| b.is_ascii_digit() || *b == b'_');
        if first == b'.' && plain_integer {
            return true;
        }
    }
    matches!(
        (last, first),
        (b'+', b'+') | (b'-', b'-') | (b'/', b'/') | (b'/', b'*') | (b'<', b'!') | (b'-', b'>')
    )
}
