//! Bracket balance checking over a token stream.

use crate::lexer::SYNTAX_ERROR;
use crate::token::{JsToken, Token};
use kiln_diagnostics::{Diagnostic, DiagnosticSink, Label};
use kiln_source::Span;

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Checks that `()`, `[]` and `{}` nest properly.
///
/// Every stray closer and every opener left unclosed at end of input is
/// reported as a [`SYNTAX_ERROR`]. Returns `true` if the stream is balanced.
pub fn check_brackets(tokens: &[Token], source: &str, sink: &DiagnosticSink) -> bool {
    let mut stack: Vec<(&str, Span)> = Vec::new();
    let mut balanced = true;
    for tok in tokens.iter().filter(|t| t.kind == JsToken::Punct) {
        let text = tok.text(source);
        match text {
            "(" | "[" | "{" => stack.push((text, tok.span)),
            ")" | "]" | "}" => match stack.last() {
                Some(&(open, _)) if closer_for(open) == text => {
                    stack.pop();
                }
                Some(&(open, open_span)) => {
                    balanced = false;
                    sink.emit(
                        Diagnostic::error(
                            SYNTAX_ERROR,
                            format!("expected '{}' but found '{text}'", closer_for(open)),
                            tok.span,
                        )
                        .with_label(Label::primary(tok.span, "mismatched bracket"))
                        .with_label(Label::secondary(open_span, format!("'{open}' opened here"))),
                    );
                    stack.pop();
                }
                None => {
                    balanced = false;
                    sink.emit(
                        Diagnostic::error(SYNTAX_ERROR, format!("unexpected '{text}'"), tok.span)
                            .with_label(Label::primary(tok.span, "no matching opener")),
                    );
                }
            },
            _ => {}
        }
    }
    let eof = tokens.last().map_or(Span::DUMMY, |t| t.span);
    for (open, span) in stack {
        balanced = false;
        sink.emit(
            Diagnostic::error(SYNTAX_ERROR, format!("unclosed '{open}'"), eof)
                .with_label(Label::secondary(span, format!("'{open}' opened here"))),
        );
    }
    balanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use kiln_source::FileId;

    fn check(source: &str) -> (bool, Vec<Diagnostic>) {
        let sink = DiagnosticSink::new();
        let tokens = lex(source, FileId::from_raw(0), &sink);
        let ok = check_brackets(&tokens, source, &sink);
        (ok, sink.take_all())
    }

    #[test]
    fn balanced_code() {
        let (ok, diags) = check("function f(a) { return [a, {b: (1)}]; }");
        assert!(ok);
        assert!(diags.is_empty());
    }

    #[test]
    fn brackets_in_strings_and_templates_ignored() {
        assert!(check("var s = '(' + `${ '[' }`;").0);
    }

    #[test]
    fn unclosed_brace() {
        let (ok, diags) = check("if (a) {\n  b();\n");
        assert!(!ok);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unclosed '{'");
        assert_eq!(diags[0].labels[0].span.start, 7);
    }

    #[test]
    fn mismatched_closer() {
        let (ok, diags) = check("foo(a];");
        assert!(!ok);
        assert_eq!(diags[0].message, "expected ')' but found ']'");
    }

    #[test]
    fn stray_closer() {
        let (ok, diags) = check("a = 1; }");
        assert!(!ok);
        assert_eq!(diags[0].message, "unexpected '}'");
    }
}
