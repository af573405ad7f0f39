//! Structured diagnostics for lint findings and source-level build errors.
//!
//! A [`Diagnostic`] carries a [`Severity`], a [`DiagnosticCode`], a message and
//! source [`Label`]s. Checks push diagnostics into a [`DiagnosticSink`]; the CLI
//! drains it and formats each entry with a [`DiagnosticRenderer`], either the
//! rustc-style [`TerminalRenderer`] or the line-delimited [`JsonRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
