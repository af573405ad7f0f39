//! Token types for the JavaScript lexer.
//!
//! Kinds are coarse: the text of an identifier, literal or punctuator is read
//! back from the source through the token's span.

use kiln_source::Span;
use serde::{Deserialize, Serialize};

/// The kind of a JavaScript token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum JsToken {
    /// A name, including private names (`#x`) and contextual keywords such
    /// as `async` or `of`.
    Identifier,
    /// A reserved word (see [`is_keyword`]).
    Keyword,
    /// A numeric or BigInt literal.
    Number,
    /// A single- or double-quoted string.
    String,
    /// A whole template literal, substitutions included.
    Template,
    /// A regular expression literal with its flags.
    Regex,
    /// An operator or punctuation mark.
    Punct,
    /// Text the lexer could not make sense of. A diagnostic was emitted.
    Error,
    /// End of input.
    Eof,
}

/// A token with its location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The token kind.
    pub kind: JsToken,
    /// Source range.
    pub span: Span,
    /// A line terminator (or a comment containing one) separates this token
    /// from the previous one.
    pub newline_before: bool,
}

impl Token {
    /// The token's text in `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start as usize..self.span.end as usize]
    }

    /// Returns `true` for a punctuator spelled `p`.
    pub fn is_punct(&self, source: &str, p: &str) -> bool {
        self.kind == JsToken::Punct && self.text(source) == p
    }

    /// Returns `true` for the keyword `kw`.
    pub fn is_keyword(&self, source: &str, kw: &str) -> bool {
        self.kind == JsToken::Keyword && self.text(source) == kw
    }
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "yield", "await",
];

/// Returns `true` if `word` is lexed as a [`JsToken::Keyword`].
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Keywords that denote a value and can therefore end an expression.
pub fn is_value_keyword(word: &str) -> bool {
    matches!(word, "this" | "super" | "null" | "true" | "false")
}

/// Keywords after which a line break ends the statement.
pub fn is_restricted_keyword(word: &str) -> bool {
    matches!(word, "return" | "break" | "continue" | "throw" | "yield" | "await")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_source::FileId;

    #[test]
    fn keyword_classes() {
        assert!(is_keyword("typeof"));
        assert!(!is_keyword("async"));
        assert!(!is_keyword("of"));
        assert!(is_value_keyword("this"));
        assert!(!is_value_keyword("return"));
        assert!(is_restricted_keyword("return"));
        assert!(!is_restricted_keyword("else"));
    }

    #[test]
    fn text_and_predicates() {
        let src = "a === b";
        let tok = Token {
            kind: JsToken::Punct,
            span: Span::new(FileId::from_raw(0), 2, 5),
            newline_before: false,
        };
        assert_eq!(tok.text(src), "===");
        assert!(tok.is_punct(src, "==="));
        assert!(!tok.is_keyword(src, "==="));
    }
}
