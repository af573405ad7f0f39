//! Evaluation of the syntax tree into a [`CssNode`] tree.
//!
//! Each block opens a scope holding the variables and mixin definitions
//! declared directly inside it. Variables are resolved lazily at the point of
//! use, so a definition later in the same scope is visible and the last one
//! wins. Nested rulesets and `@media` blocks are flattened into top-level CSS
//! with their selectors joined to the enclosing ones.

use crate::ast::{AtRule, MixinCall, Node, RuleSet, VariableDecl};
use crate::css::CssNode;
use crate::error::LessError;
use crate::ops;
use kiln_source::{SourceDb, Span};
use std::collections::HashMap;

/// Hoisted bodiless statements (`@charset`, CSS `@import`) and the rule tree.
pub type Evaluated = (Vec<String>, Vec<CssNode>);

/// Evaluates a fully import-expanded stylesheet.
pub fn evaluate(nodes: &[Node], db: &SourceDb) -> Result<Evaluated, LessError> {
    let mut ev = Evaluator {
        db,
        scopes: Vec::new(),
        resolving: Vec::new(),
        mixin_stack: Vec::new(),
        statements: Vec::new(),
    };
    let root = Context {
        selectors: Vec::new(),
        accepts_declarations: false,
        important: false,
    };
    let mut declarations = Vec::new();
    let mut out = Vec::new();
    ev.with_scope(nodes, |ev| ev.eval_body(nodes, &root, &mut declarations, &mut out))?;
    Ok((ev.statements, out))
}

#[derive(Default)]
struct Scope<'n> {
    variables: HashMap<&'n str, &'n VariableDecl>,
    mixins: HashMap<&'n str, Vec<&'n RuleSet>>,
}

impl<'n> Scope<'n> {
    fn collect(nodes: &'n [Node]) -> Self {
        let mut scope = Scope::default();
        for node in nodes {
            match node {
                Node::Variable(v) => {
                    scope.variables.insert(v.name.as_str(), v);
                }
                Node::Rule(r) => {
                    if let Some((name, _)) = mixin_definition(&r.selectors) {
                        scope.mixins.entry(name).or_default().push(r);
                    }
                }
                _ => {}
            }
        }
        scope
    }
}

#[derive(Clone)]
struct Context {
    selectors: Vec<String>,
    accepts_declarations: bool,
    important: bool,
}

struct Evaluator<'n> {
    db: &'n SourceDb,
    scopes: Vec<Scope<'n>>,
    resolving: Vec<&'n str>,
    mixin_stack: Vec<&'n str>,
    statements: Vec<String>,
}

impl<'n> Evaluator<'n> {
    fn with_scope<T>(
        &mut self,
        nodes: &'n [Node],
        f: impl FnOnce(&mut Self) -> Result<T, LessError>,
    ) -> Result<T, LessError> {
        self.scopes.push(Scope::collect(nodes));
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn eval_body(
        &mut self,
        nodes: &'n [Node],
        ctx: &Context,
        declarations: &mut Vec<String>,
        out: &mut Vec<CssNode>,
    ) -> Result<(), LessError> {
        for node in nodes {
            match node {
                Node::Variable(_) | Node::Import(_) => {}
                Node::Declaration(d) => {
                    if !ctx.accepts_declarations {
                        return Err(self.syntax("declarations must be inside a ruleset", d.span));
                    }
                    if d.name.starts_with('&') {
                        return Err(self.syntax("`:extend` is not supported", d.span));
                    }
                    let name = self.interpolate(&d.name, d.span)?;
                    let value = self.value(&d.value, d.span)?;
                    let mut decl = format!("{name}: {value}");
                    if ctx.important && !value.ends_with("!important") {
                        decl.push_str(" !important");
                    }
                    declarations.push(decl);
                }
                Node::Rule(r) => self.rule(r, ctx, out)?,
                Node::AtRule(a) => self.at_rule(a, ctx, out)?,
                Node::Statement(s) => {
                    let text = self.interpolate(&s.text, s.span)?;
                    self.statements.push(text);
                }
                Node::MixinCall(call) => self.mixin_call(call, ctx, declarations, out)?,
            }
        }
        Ok(())
    }

    fn rule(&mut self, rule: &'n RuleSet, ctx: &Context, out: &mut Vec<CssNode>) -> Result<(), LessError> {
        if let Some((_, true)) = mixin_definition(&rule.selectors) {
            return Ok(());
        }
        if let Some(message) = unsupported_selector(&rule.selectors) {
            return Err(self.syntax(message, rule.span));
        }
        let own = split_selectors(&self.interpolate(&rule.selectors, rule.span)?);
        let selectors = join_selectors(&ctx.selectors, &own);
        let inner = Context {
            selectors: selectors.clone(),
            accepts_declarations: true,
            important: ctx.important,
        };
        let mut declarations = Vec::new();
        let mut nested = Vec::new();
        self.with_scope(&rule.children, |ev| {
            ev.eval_body(&rule.children, &inner, &mut declarations, &mut nested)
        })?;
        out.push(CssNode::Rule {
            selectors,
            declarations,
        });
        out.extend(nested);
        Ok(())
    }

    fn at_rule(&mut self, at: &'n AtRule, ctx: &Context, out: &mut Vec<CssNode>) -> Result<(), LessError> {
        let prelude = self.prelude(&at.prelude, at.span)?;
        let header = if prelude.is_empty() {
            format!("@{}", at.name)
        } else {
            format!("@{} {prelude}", at.name)
        };

        if !matches!(at.name.as_str(), "media" | "supports") {
            let inner = Context {
                selectors: Vec::new(),
                accepts_declarations: true,
                important: false,
            };
            let mut declarations = Vec::new();
            let mut children = Vec::new();
            self.with_scope(&at.children, |ev| {
                ev.eval_body(&at.children, &inner, &mut declarations, &mut children)
            })?;
            out.push(CssNode::Block {
                prelude: header,
                declarations,
                children,
            });
            return Ok(());
        }

        // Conditional group rules bubble: declarations inside them belong to
        // the enclosing selectors.
        let inner = Context {
            accepts_declarations: !ctx.selectors.is_empty(),
            ..ctx.clone()
        };
        let mut own = Vec::new();
        let mut nested = Vec::new();
        self.with_scope(&at.children, |ev| {
            ev.eval_body(&at.children, &inner, &mut own, &mut nested)
        })?;
        let mut children = Vec::new();
        if !own.is_empty() {
            children.push(CssNode::Rule {
                selectors: ctx.selectors.clone(),
                declarations: own,
            });
        }
        children.extend(nested);

        let prefix = format!("@{} ", at.name);
        let (inner_groups, rest): (Vec<CssNode>, Vec<CssNode>) = children
            .into_iter()
            .partition(|c| matches!(c, CssNode::Block { prelude, .. } if prelude.starts_with(&prefix)));
        out.push(CssNode::Block {
            prelude: header.clone(),
            declarations: Vec::new(),
            children: rest,
        });
        for group in inner_groups {
            if let CssNode::Block {
                prelude,
                declarations,
                children,
            } = group
            {
                out.push(CssNode::Block {
                    prelude: format!("{header} and {}", &prelude[prefix.len()..]),
                    declarations,
                    children,
                });
            }
        }
        Ok(())
    }

    fn mixin_call(
        &mut self,
        call: &'n MixinCall,
        ctx: &Context,
        declarations: &mut Vec<String>,
        out: &mut Vec<CssNode>,
    ) -> Result<(), LessError> {
        let definitions = self
            .scopes
            .iter()
            .rev()
            .find_map(|s| s.mixins.get(call.name.as_str()))
            .cloned();
        let Some(definitions) = definitions else {
            return Err(LessError::UndefinedMixin {
                name: call.name.clone(),
                span: call.span,
                location: self.db.resolve_span(call.span),
            });
        };
        if self.mixin_stack.contains(&call.name.as_str()) {
            return Err(self.syntax(format!("mixin {} calls itself", call.name), call.span));
        }
        let inner = Context {
            important: ctx.important || call.important,
            ..ctx.clone()
        };
        self.mixin_stack.push(call.name.as_str());
        let result = definitions.into_iter().try_for_each(|def| {
            self.with_scope(&def.children, |ev| {
                ev.eval_body(&def.children, &inner, declarations, out)
            })
        });
        self.mixin_stack.pop();
        result
    }

    fn variable(&mut self, name: &str, span: Span) -> Result<String, LessError> {
        let decl = self
            .scopes
            .iter()
            .rev()
            .find_map(|s| s.variables.get(name).copied());
        let Some(decl) = decl else {
            return Err(LessError::UndefinedVariable {
                name: name.to_string(),
                span,
                location: self.db.resolve_span(span),
            });
        };
        if self.resolving.contains(&decl.name.as_str()) {
            return Err(self.syntax(format!("recursive variable definition for @{name}"), decl.span));
        }
        self.resolving.push(decl.name.as_str());
        let value = self.value(&decl.value, decl.span);
        self.resolving.pop();
        value
    }

    /// Resolves `@name`, `@{name}` and `~"escapes"` in a value, then
    /// evaluates its operations.
    fn value(&mut self, text: &str, span: Span) -> Result<String, LessError> {
        let mut protected = Vec::new();
        let substituted = self.substitute(text, span, Some(&mut protected))?;
        ops::evaluate(&collapse_whitespace(&substituted), &protected)
            .map_err(|message| self.syntax(message, span))
    }

    /// Resolves variables in an at-rule prelude. `(min-aspect-ratio: 16/9)`
    /// is not arithmetic, so operations are left alone.
    fn prelude(&mut self, text: &str, span: Span) -> Result<String, LessError> {
        let mut protected = Vec::new();
        let substituted = self.substitute(text, span, Some(&mut protected))?;
        Ok(ops::restore(&collapse_whitespace(&substituted), &protected))
    }

    /// Resolves `@{name}` only, for selectors and property names.
    fn interpolate(&mut self, text: &str, span: Span) -> Result<String, LessError> {
        self.substitute(text, span, None)
    }

    /// With `protected`, also resolves `@name` and `~"escapes"`. Escapes and
    /// variable values that are not a single number or colour are stored in
    /// `protected` so operations cannot reach into them.
    fn substitute(
        &mut self,
        text: &str,
        span: Span,
        mut protected: Option<&mut Vec<String>>,
    ) -> Result<String, LessError> {
        let variables = protected.is_some();
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut run = 0;
        let mut i = 0;
        let mut quote: Option<u8> = None;
        while i < bytes.len() {
            let c = bytes[i];
            if c == b'@' && bytes.get(i + 1) == Some(&b'{') {
                if let Some(rel) = text[i..].find('}') {
                    out.push_str(&text[run..i]);
                    let value = self.variable(&text[i + 2..i + rel], span)?;
                    out.push_str(unquote(&value));
                    i += rel + 1;
                    run = i;
                    continue;
                }
            }
            match quote {
                Some(q) => {
                    if c == b'\\' {
                        i += 2;
                        continue;
                    }
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    b'"' | b'\'' => quote = Some(c),
                    b'~' if variables && matches!(bytes.get(i + 1), Some(b'"' | b'\'')) => {
                        let q = bytes[i + 1] as char;
                        let close = text[i + 2..].find(q);
                        if let (Some(rel), Some(p)) = (close, protected.as_deref_mut()) {
                            out.push_str(&text[run..i]);
                            let inner = self.substitute(&text[i + 2..i + 2 + rel], span, None)?;
                            out.push_str(&ops::protect(inner, p));
                            i += rel + 3;
                            run = i;
                            continue;
                        }
                    }
                    b'@' if variables => {
                        let starts_name = bytes
                            .get(i + 1)
                            .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'_' | b'-'));
                        if starts_name {
                            let len = bytes[i + 1..]
                                .iter()
                                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
                                .count();
                            out.push_str(&text[run..i]);
                            let value = self.variable(&text[i + 1..i + 1 + len], span)?;
                            match protected.as_deref_mut() {
                                Some(p) if !ops::is_operand(&value) => {
                                    out.push_str(&ops::protect(value, p));
                                }
                                _ => out.push_str(&value),
                            }
                            i += 1 + len;
                            run = i;
                            continue;
                        }
                    }
                    _ => {}
                },
            }
            i += 1;
        }
        if run < text.len() {
            out.push_str(&text[run..]);
        }
        Ok(out)
    }

    fn syntax(&self, message: impl Into<String>, span: Span) -> LessError {
        LessError::Syntax {
            message: message.into(),
            span,
            location: self.db.resolve_span(span),
        }
    }
}

/// Recognizes `.name` / `#name` / `.name()` rulesets usable as mixins.
/// The flag is `true` for the parenthesized form, which emits no CSS itself.
fn mixin_definition(selectors: &str) -> Option<(&str, bool)> {
    let s = selectors.trim();
    if !s.starts_with(['.', '#']) {
        return None;
    }
    let end = s[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .map_or(s.len(), |i| i + 1);
    if end == 1 {
        return None;
    }
    let (name, rest) = s.split_at(end);
    let rest = rest.trim();
    if rest.is_empty() {
        return Some((name, false));
    }
    let parens = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .is_some_and(|inner| inner.trim().is_empty());
    parens.then_some((name, true))
}

/// Rejects guards, `:extend` and parametric mixins.
fn unsupported_selector(selectors: &str) -> Option<&'static str> {
    if selectors.split_whitespace().any(|w| w == "when") {
        return Some("guards (`when`) are not supported");
    }
    if selectors.contains(":extend(") {
        return Some("`:extend` is not supported");
    }
    let s = selectors.trim();
    if !s.starts_with(['.', '#']) {
        return None;
    }
    let name_len = s[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len() - 1);
    if name_len > 0 && s[1 + name_len..].trim_start().starts_with('(') {
        return Some("parametric mixins are not supported");
    }
    None
}

fn unquote(value: &str) -> &str {
    let b = value.as_bytes();
    if b.len() >= 2 && matches!(b[0], b'"' | b'\'') && b[b.len() - 1] == b[0] {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Collapses whitespace runs outside quoted strings into one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for c in text.trim().chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Splits a selector list at top-level commas.
fn split_selectors(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
        .into_iter()
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Joins nested selectors to their parents. `&` stands for the parent;
/// without it the child is a descendant.
fn join_selectors(parents: &[String], own: &[String]) -> Vec<String> {
    if parents.is_empty() {
        return own.iter().map(|s| s.replace('&', "").trim().to_string()).collect();
    }
    let mut joined = Vec::with_capacity(parents.len() * own.len());
    for parent in parents {
        for child in own {
            if child.contains('&') {
                joined.push(child.replace('&', parent));
            } else {
                joined.push(format!("{parent} {child}"));
            }
        }
    }
    joined
}
