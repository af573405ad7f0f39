//! Syntax tree for the LESS subset.
//!
//! Selectors, property names and values are kept as raw text; variable
//! references and interpolations inside them are resolved during evaluation.

use kiln_source::Span;

/// A statement inside a stylesheet or a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `@name: value;`
    Variable(VariableDecl),
    /// `property: value;`
    Declaration(Declaration),
    /// `selectors { ... }`
    Rule(RuleSet),
    /// A block at-rule such as `@media` or `@font-face`.
    AtRule(AtRule),
    /// A bodiless at-rule kept as written, e.g. `@charset "utf-8";` or an
    /// `@import` of a plain CSS file.
    Statement(AtStatement),
    /// `@import "file";` of another LESS file, inlined before evaluation.
    Import(Import),
    /// `.name;` or `.name();`
    MixinCall(MixinCall),
}

/// A variable definition.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    /// Name without the leading `@`.
    pub name: String,
    /// Raw value text.
    pub value: String,
    /// Source span.
    pub span: Span,
}

/// A property declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name, possibly containing `@{...}`.
    pub name: String,
    /// Raw value text.
    pub value: String,
    /// Source span.
    pub span: Span,
}

/// A ruleset.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    /// The comma-separated selector list as written.
    pub selectors: String,
    /// Statements inside the braces.
    pub children: Vec<Node>,
    /// Span of the selector list.
    pub span: Span,
}

/// A block at-rule.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Lowercased name without the `@`, e.g. `media`.
    pub name: String,
    /// Text between the name and the opening brace.
    pub prelude: String,
    /// Statements inside the braces.
    pub children: Vec<Node>,
    /// Span of the rule header.
    pub span: Span,
}

/// A bodiless at-rule copied to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct AtStatement {
    /// The full statement without the trailing `;`.
    pub text: String,
    /// Source span.
    pub span: Span,
}

/// An import of another LESS file.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// The path as written, unquoted.
    pub path: String,
    /// Source span.
    pub span: Span,
}

/// A non-parametric mixin call.
#[derive(Debug, Clone, PartialEq)]
pub struct MixinCall {
    /// The called selector, e.g. `.rounded`.
    pub name: String,
    /// Whether the call ends in `!important`.
    pub important: bool,
    /// Source span.
    pub span: Span,
}
