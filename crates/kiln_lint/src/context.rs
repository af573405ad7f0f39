//! Per-file input shared by all rules.

use kiln_diagnostics::{Diagnostic, DiagnosticSink};
use kiln_js::{check_brackets, lex, JsToken, Token};
use kiln_source::FileId;

/// A lexed script.
pub struct LintContext<'a> {
    /// Full source text.
    pub source: &'a str,
    /// File the spans refer to.
    pub file: FileId,
    /// Tokens, ending with [`JsToken::Eof`].
    pub tokens: Vec<Token>,
    /// Lexer and bracket errors found while tokenizing.
    pub syntax_errors: Vec<Diagnostic>,
}

impl<'a> LintContext<'a> {
    /// Lexes `source` and checks its brackets.
    pub fn new(source: &'a str, file: FileId) -> Self {
        let sink = DiagnosticSink::new();
        let tokens = lex(source, file, &sink);
        check_brackets(&tokens, source, &sink);
        Self {
            source,
            file,
            tokens,
            syntax_errors: sink.take_all(),
        }
    }

    /// Returns `true` if the script did not tokenize cleanly.
    pub fn has_syntax_errors(&self) -> bool {
        !self.syntax_errors.is_empty()
    }

    /// Tokens other than the end-of-input marker.
    pub fn significant(&self) -> impl Iterator<Item = (usize, &Token)> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind != JsToken::Eof)
    }

    /// The token's text.
    pub fn text(&self, tok: &Token) -> &'a str {
        tok.text(self.source)
    }
}
