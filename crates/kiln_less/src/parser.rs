//! Recursive-descent parser producing the [`Node`] tree of one file.
//!
//! The parser only splits the input into statements and blocks. Statement
//! text is scanned with awareness of strings, parentheses, comments and
//! `@{...}` interpolations so that `;`, `{` and `}` inside them do not end a
//! statement.

use crate::ast::{AtRule, AtStatement, Declaration, Import, MixinCall, Node, RuleSet, VariableDecl};
use kiln_source::{FileId, Span};
use regex::Regex;
use std::sync::LazyLock;

static MIXIN_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([.#][A-Za-z_-][\w-]*)\s*(?:\(\s*\))?\s*(!\s*important)?$")
        .expect("mixin call pattern is valid")
});

/// At-rule names that are never variable definitions, even when followed by
/// a colon (`@page :first`).
const CSS_AT_RULES: &[&str] = &[
    "charset",
    "counter-style",
    "document",
    "font-face",
    "font-feature-values",
    "import",
    "keyframes",
    "media",
    "namespace",
    "page",
    "supports",
    "viewport",
];

/// A malformed construct found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human-readable description.
    pub message: String,
    /// Where the construct starts.
    pub span: Span,
}

/// Parses one LESS source file.
pub fn parse(source: &str, file: FileId) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser {
        src: source,
        bytes: source.as_bytes(),
        file,
        pos: 0,
    };
    parser.block_body(None)
}

struct Parser<'src> {
    src: &'src str,
    bytes: &'src [u8],
    file: FileId,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, message: impl Into<String>, start: usize, end: usize) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            span: Span::new(self.file, start as u32, end as u32),
        }
    }

    /// Statements up to the `}` matching the `{` at `open`, or to the end of
    /// input at top level.
    fn block_body(&mut self, open: Option<usize>) -> Result<Vec<Node>, SyntaxError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.at_end() {
                return match open {
                    Some(open) => Err(self.error("unterminated block", open, open + 1)),
                    None => Ok(nodes),
                };
            }
            match self.peek() {
                b'}' => {
                    if open.is_none() {
                        return Err(self.error("unexpected '}'", self.pos, self.pos + 1));
                    }
                    self.pos += 1;
                    return Ok(nodes);
                }
                b';' => self.pos += 1,
                b'@' if self.peek_at(1) != b'{' => nodes.push(self.at_rule()?),
                _ => {
                    if let Some(node) = self.rule_or_statement()? {
                        nodes.push(node);
                    }
                }
            }
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0c => self.pos += 1,
                b'/' if self.peek_at(1) == b'*' => self.skip_block_comment()?,
                b'/' if self.peek_at(1) == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(rel) => {
                self.pos = start + 2 + rel + 2;
                Ok(())
            }
            None => Err(self.error("unterminated comment", start, start + 2)),
        }
    }

    /// Reads statement text up to one of `stops` at nesting depth zero.
    ///
    /// Comments are dropped from the returned text. The stop byte is not
    /// consumed; `None` means the input ended first.
    fn read_until(&mut self, stops: &[u8]) -> Result<(String, Option<u8>), SyntaxError> {
        let mut text = String::new();
        let mut run = self.pos;
        let mut depth = 0usize;
        while !self.at_end() {
            let c = self.peek();
            match c {
                b'"' | b'\'' => {
                    self.skip_string(c)?;
                    continue;
                }
                b'/' if self.peek_at(1) == b'*' => {
                    text.push_str(&self.src[run..self.pos]);
                    self.skip_block_comment()?;
                    run = self.pos;
                    continue;
                }
                b'/' if self.peek_at(1) == b'/' && depth == 0 => {
                    text.push_str(&self.src[run..self.pos]);
                    while !self.at_end() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                    run = self.pos;
                    continue;
                }
                b'@' if self.peek_at(1) == b'{' => {
                    let start = self.pos;
                    match self.src[start..].find('}') {
                        Some(rel) => self.pos = start + rel + 1,
                        None => return Err(self.error("unterminated interpolation", start, start + 2)),
                    }
                    continue;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                _ if depth == 0 && stops.contains(&c) => {
                    text.push_str(&self.src[run..self.pos]);
                    return Ok((text, Some(c)));
                }
                _ => {}
            }
            self.pos += 1;
        }
        text.push_str(&self.src[run..self.pos]);
        Ok((text, None))
    }

    fn skip_string(&mut self, quote: u8) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        while !self.at_end() {
            match self.peek() {
                b'\\' => self.pos += 2,
                b'\n' => break,
                c if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error("unterminated string", start, start + 1))
    }

    fn rule_or_statement(&mut self) -> Result<Option<Node>, SyntaxError> {
        let start = self.pos;
        let (text, stop) = self.read_until(b"{;}")?;
        let span = self.span_from(start);
        let head = text.trim();
        match stop {
            Some(b'{') => {
                let open = self.pos;
                self.pos += 1;
                let children = self.block_body(Some(open))?;
                if head.is_empty() {
                    return Err(self.error("expected a selector", open, open + 1));
                }
                Ok(Some(Node::Rule(RuleSet {
                    selectors: head.to_string(),
                    children,
                    span,
                })))
            }
            _ => {
                if stop == Some(b';') {
                    self.pos += 1;
                }
                if head.is_empty() {
                    return Ok(None);
                }
                self.statement(head, span).map(Some)
            }
        }
    }

    fn statement(&self, text: &str, span: Span) -> Result<Node, SyntaxError> {
        if let Some(caps) = MIXIN_CALL_RE.captures(text) {
            return Ok(Node::MixinCall(MixinCall {
                name: caps[1].to_string(),
                important: caps.get(2).is_some(),
                span,
            }));
        }
        match text.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(Node::Declaration(Declaration {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                    span,
                }))
            }
            _ => Err(SyntaxError {
                message: format!("expected a declaration or a ruleset, found '{text}'"),
                span,
            }),
        }
    }

    fn at_rule(&mut self) -> Result<Node, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let name_start = self.pos;
        while self.peek().is_ascii_alphanumeric() || matches!(self.peek(), b'-' | b'_') {
            self.pos += 1;
        }
        let name = self.src[name_start..self.pos].to_string();
        if name.is_empty() {
            return Err(self.error("expected a name after '@'", start, start + 1));
        }
        let lowered = name.to_ascii_lowercase();

        let after_name = self.pos;
        self.skip_trivia()?;
        if self.peek() == b':' && !is_css_at_rule(&lowered) {
            self.pos += 1;
            let (value, stop) = self.read_until(b"{;}")?;
            if stop == Some(b'{') {
                return Err(self.error("detached rulesets are not supported", start, self.pos));
            }
            if stop == Some(b';') {
                self.pos += 1;
            }
            return Ok(Node::Variable(VariableDecl {
                name,
                value: value.trim().to_string(),
                span: self.span_from(start),
            }));
        }
        self.pos = after_name;

        let (prelude, stop) = self.read_until(b"{;}")?;
        let span = self.span_from(start);
        let prelude = prelude.trim().to_string();
        if stop == Some(b'{') {
            let open = self.pos;
            self.pos += 1;
            let children = self.block_body(Some(open))?;
            return Ok(Node::AtRule(AtRule {
                name: lowered,
                prelude,
                children,
                span,
            }));
        }
        if stop == Some(b';') {
            self.pos += 1;
        }
        if lowered == "import" {
            return import(&prelude, span);
        }
        let text = if prelude.is_empty() {
            format!("@{name}")
        } else {
            format!("@{name} {prelude}")
        };
        Ok(Node::Statement(AtStatement { text, span }))
    }
}

fn is_css_at_rule(name: &str) -> bool {
    let unprefixed = match name.strip_prefix('-') {
        Some(rest) => rest.split_once('-').map_or(rest, |(_, n)| n),
        None => name,
    };
    CSS_AT_RULES.contains(&unprefixed)
}

/// Classifies an `@import`: LESS files are inlined, everything else is kept.
fn import(prelude: &str, span: Span) -> Result<Node, SyntaxError> {
    let mut rest = prelude;
    let mut css_option = false;
    if let Some(opts) = rest.strip_prefix('(') {
        let Some((options, after)) = opts.split_once(')') else {
            return Err(SyntaxError {
                message: "unterminated import options".to_string(),
                span,
            });
        };
        css_option = options.split(',').any(|o| o.trim() == "css");
        rest = after.trim_start();
    }
    let keep = || {
        Ok(Node::Statement(AtStatement {
            text: format!("@import {prelude}"),
            span,
        }))
    };
    if rest.get(..4).is_some_and(|s| s.eq_ignore_ascii_case("url(")) {
        return keep();
    }
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''));
    let Some(quote) = quote else {
        return Err(SyntaxError {
            message: "expected a quoted import path".to_string(),
            span,
        });
    };
    let Some((path, media)) = rest[1..].split_once(quote) else {
        return Err(SyntaxError {
            message: "unterminated string".to_string(),
            span,
        });
    };
    let is_css = css_option
        || path.ends_with(".css")
        || path.starts_with("//")
        || path.contains("://")
        || !media.trim().is_empty();
    if is_css {
        return keep();
    }
    Ok(Node::Import(Import {
        path: path.to_string(),
        span,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Vec<Node> {
        parse(src, FileId::from_raw(0)).unwrap()
    }

    fn parse_err(src: &str) -> SyntaxError {
        parse(src, FileId::from_raw(0)).unwrap_err()
    }

    #[test]
    fn variables_rules_declarations() {
        let nodes = parse_ok("@c: #fff;\n.a, .b {\n  color: @c;\n  .mix;\n}\n");
        assert_eq!(nodes.len(), 2);
        let Node::Variable(v) = &nodes[0] else { panic!("expected variable") };
        assert_eq!((v.name.as_str(), v.value.as_str()), ("c", "#fff"));
        let Node::Rule(r) = &nodes[1] else { panic!("expected rule") };
        assert_eq!(r.selectors, ".a, .b");
        assert!(matches!(&r.children[0], Node::Declaration(d) if d.name == "color" && d.value == "@c"));
        assert!(matches!(&r.children[1], Node::MixinCall(m) if m.name == ".mix" && !m.important));
    }

    #[test]
    fn last_statement_without_semicolon() {
        let nodes = parse_ok(".a { color: red }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert!(matches!(&r.children[0], Node::Declaration(d) if d.value == "red"));
    }

    #[test]
    fn pseudo_selectors_and_values_with_colons() {
        let nodes = parse_ok("a:hover { filter: progid:DX.Alpha(opacity=50); }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert_eq!(r.selectors, "a:hover");
        assert!(matches!(&r.children[0], Node::Declaration(d) if d.value == "progid:DX.Alpha(opacity=50)"));
    }

    #[test]
    fn comments_dropped_but_urls_kept() {
        let nodes = parse_ok("// top\n.a { /* x */ background: url(http://x.org/a.png); // end\n }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert_eq!(r.children.len(), 1);
        assert!(matches!(&r.children[0], Node::Declaration(d) if d.value == "url(http://x.org/a.png)"));
    }

    #[test]
    fn semicolons_inside_strings_and_parens() {
        let nodes = parse_ok(".a { content: \"a;b}\"; background: url(data:image/png;base64,AA); }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert_eq!(r.children.len(), 2);
    }

    #[test]
    fn interpolated_selector_and_property() {
        let nodes = parse_ok(".@{name}-x { @{p}: 1; }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert_eq!(r.selectors, ".@{name}-x");
        assert!(matches!(&r.children[0], Node::Declaration(d) if d.name == "@{p}"));
    }

    #[test]
    fn at_rules() {
        let nodes = parse_ok("@charset \"utf-8\";\n@media screen { .a { x: 1 } }\n@page :first { margin: 0 }");
        assert!(matches!(&nodes[0], Node::Statement(s) if s.text == "@charset \"utf-8\""));
        assert!(matches!(&nodes[1], Node::AtRule(a) if a.name == "media" && a.prelude == "screen"));
        assert!(matches!(&nodes[2], Node::AtRule(a) if a.name == "page" && a.prelude == ":first"));
    }

    #[test]
    fn imports_classified() {
        let nodes = parse_ok(
            "@import \"vars\";\n@import 'reset.css';\n@import url(x.css);\n@import (css) \"y\";\n@import \"p.less\" screen;",
        );
        assert!(matches!(&nodes[0], Node::Import(i) if i.path == "vars"));
        assert!(matches!(&nodes[1], Node::Statement(s) if s.text == "@import 'reset.css'"));
        assert!(matches!(&nodes[2], Node::Statement(s) if s.text == "@import url(x.css)"));
        assert!(matches!(&nodes[3], Node::Statement(_)));
        assert!(matches!(&nodes[4], Node::Statement(_)));
    }

    #[test]
    fn important_mixin_call() {
        let nodes = parse_ok(".a { .b() !important; }");
        let Node::Rule(r) = &nodes[0] else { panic!("expected rule") };
        assert!(matches!(&r.children[0], Node::MixinCall(m) if m.name == ".b" && m.important));
    }

    #[test]
    fn unterminated_block_points_at_brace() {
        let err = parse_err(".a {\n  color: red;\n");
        assert_eq!(err.message, "unterminated block");
        assert_eq!(err.span.start, 3);
    }

    #[test]
    fn unterminated_string_and_comment() {
        assert_eq!(parse_err(".a { content: \"oops; }").message, "unterminated string");
        assert_eq!(parse_err("/* never closed").message, "unterminated comment");
    }

    #[test]
    fn stray_closer_and_garbage() {
        assert_eq!(parse_err(".a { } }").message, "unexpected '}'");
        assert!(parse_err(".a { nonsense; }").message.starts_with("expected a declaration"));
    }
}
