//! W005: Missing semicolon: a statement ended by a line break alone.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Severity};
use kiln_js::{is_value_keyword, JsToken, Token};

use crate::{LintContext, LintRule};

/// Flags statements that rely on automatic semicolon insertion.
///
/// A statement is considered unterminated when a token that can end an
/// expression is followed, on a new line, by a token that starts a new
/// statement, by a closing `}` or by the end of the file. Only statement
/// positions are checked: inside parentheses, brackets and object literals
/// line breaks are never significant.
pub struct MissingSemicolon;

#[derive(Clone, Copy, PartialEq)]
enum Bracket {
    /// `(`; `true` when it holds an `if`/`for`/`while`/`with` header.
    Paren(bool),
    Square,
    /// `{` of a statement block; `true` for a function body in expression
    /// position, whose `}` ends an expression.
    Block(bool),
    Object,
}

impl LintRule for MissingSemicolon {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 5)
    }

    fn name(&self) -> &str {
        "missing-semicolon"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        let src = ctx.source;
        let mut stack: Vec<Bracket> = Vec::new();
        let mut prev: Option<&Token> = None;
        let mut prev_closes_header = false;
        let mut prev_closes_expression = false;
        let mut function_expression = false;

        for tok in &ctx.tokens {
            if let Some(p) = prev {
                let boundary = tok.kind == JsToken::Eof || tok.newline_before;
                let statement_level = matches!(stack.last(), None | Some(Bracket::Block(_)));
                let closes = if ctx.text(p) == "}" {
                    prev_closes_expression
                } else {
                    !prev_closes_header
                };
                if boundary
                    && statement_level
                    && ends_expression(p, src, closes)
                    && (tok.kind == JsToken::Eof || tok.is_punct(src, "}") || starts_statement(tok, src))
                {
                    sink.emit(
                        Diagnostic::warning(self.code(), "missing semicolon", p.span)
                            .with_label(Label::primary(p.span, "expected ';' after this")),
                    );
                }
            }

            prev_closes_header = false;
            prev_closes_expression = false;
            if tok.is_keyword(src, "function") {
                function_expression = in_expression(prev, src);
            }
            if tok.kind == JsToken::Punct {
                match ctx.text(tok) {
                    "(" => {
                        let header = prev.is_some_and(|p| {
                            ["if", "for", "while", "with"]
                                .iter()
                                .any(|kw| p.is_keyword(src, kw))
                        });
                        stack.push(Bracket::Paren(header));
                    }
                    "[" => stack.push(Bracket::Square),
                    "{" => {
                        let arrow = prev.is_some_and(|p| p.is_punct(src, "=>"));
                        stack.push(if opens_block(prev, src) {
                            Bracket::Block(arrow || function_expression)
                        } else {
                            Bracket::Object
                        });
                        function_expression = false;
                    }
                    ")" => prev_closes_header = stack.pop() == Some(Bracket::Paren(true)),
                    "}" => {
                        prev_closes_expression =
                            matches!(stack.pop(), Some(Bracket::Object | Bracket::Block(true)));
                    }
                    "]" => {
                        stack.pop();
                    }
                    _ => {}
                }
            }
            prev = Some(tok);
        }
    }
}

/// `closes` tells whether a closing `)` or `}` completes an expression
/// rather than a control header or a statement block.
fn ends_expression(tok: &Token, src: &str, closes: bool) -> bool {
    match tok.kind {
        JsToken::Identifier
        | JsToken::Number
        | JsToken::String
        | JsToken::Template
        | JsToken::Regex => true,
        JsToken::Keyword => is_value_keyword(tok.text(src)),
        JsToken::Punct => match tok.text(src) {
            ")" | "}" => closes,
            "]" | "++" | "--" => true,
            _ => false,
        },
        _ => false,
    }
}

fn starts_statement(tok: &Token, src: &str) -> bool {
    match tok.kind {
        JsToken::Identifier | JsToken::Number | JsToken::String | JsToken::Template => true,
        JsToken::Keyword => !matches!(
            tok.text(src),
            "in" | "instanceof" | "else" | "catch" | "finally"
        ),
        JsToken::Punct => matches!(tok.text(src), "++" | "--"),
        _ => false,
    }
}

/// Whether a `function` keyword after `prev` starts a function expression
/// rather than a declaration.
fn in_expression(prev: Option<&Token>, src: &str) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    match prev.kind {
        JsToken::Punct => !matches!(prev.text(src), ";" | "{" | "}" | ")"),
        JsToken::Keyword => !matches!(prev.text(src), "else" | "do"),
        _ => false,
    }
}

/// Whether a `{` after `prev` opens a statement block rather than an
/// object literal.
fn opens_block(prev: Option<&Token>, src: &str) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    match prev.kind {
        JsToken::Punct => matches!(prev.text(src), ")" | ";" | "{" | "}" | "=>"),
        JsToken::Keyword => matches!(prev.text(src), "else" | "do" | "try" | "finally"),
        // `class Name {` and `class A extends B {`
        JsToken::Identifier => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::check;

    #[test]
    fn flags_statements_ended_by_newline() {
        let diags = check(&MissingSemicolon, "var a = 1\nfoo()\n");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].primary_span.start, 8);
        assert_eq!(diags[1].primary_span.start, 14);
    }

    #[test]
    fn flags_last_statement_of_block() {
        let diags = check(&MissingSemicolon, "function f() {\n  return a\n}\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].primary_span.start, 24);
    }

    #[test]
    fn continuation_lines_are_not_flagged() {
        let src = "if (a)\n  b();\nvar o = {\n  a: 1,\n  b: [\n    2\n  ]\n};\nvar s = a\n  + b;\n";
        assert!(check(&MissingSemicolon, src).is_empty());
    }

    #[test]
    fn else_after_braceless_if_is_not_flagged() {
        assert!(check(&MissingSemicolon, "if (a) b();\nelse c();\n").is_empty());
    }

    #[test]
    fn flags_function_expression_ended_by_newline() {
        let diags = check(&MissingSemicolon, "var f = function () {\n}\nfoo()\n");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].primary_span.start, 22);

        let diags = check(&MissingSemicolon, "var o = {\n  a: 1\n}\nvar g = () => {\n}\n");
        let starts: Vec<u32> = diags.iter().map(|d| d.primary_span.start).collect();
        assert_eq!(starts, vec![18, 35]);
    }

    #[test]
    fn declaration_and_statement_blocks_are_not_flagged() {
        let src = "function f() {\n}\nif (a) {\n  b();\n}\nfoo();\nclass A {\n  m() {\n  }\n  n() {\n  }\n}\n";
        assert!(check(&MissingSemicolon, src).is_empty());
    }

    #[test]
    fn object_literal_return_is_not_flagged_inside() {
        let src = "function f() {\n  return {\n    a: b\n  };\n}\n";
        assert!(check(&MissingSemicolon, src).is_empty());
    }
}
