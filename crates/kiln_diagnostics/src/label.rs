//! Annotated ranges shown beneath a diagnostic's source excerpt.

use kiln_source::Span;
use serde::{Deserialize, Serialize};

/// Whether a label marks the finding itself or related context.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// Underlined with `^`.
    Primary,
    /// Underlined with `-`.
    Secondary,
}

/// A span with a short message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// Annotated range.
    pub span: Span,
    /// Text printed after the underline.
    pub message: String,
    /// Underline style.
    pub style: LabelStyle,
}

impl Label {
    /// A label on the finding itself.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// A label on related context, such as an opening bracket.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }

    /// Underline character for this label's style.
    pub fn marker(&self) -> char {
        match self.style {
            LabelStyle::Primary => '^',
            LabelStyle::Secondary => '-',
        }
    }
}
