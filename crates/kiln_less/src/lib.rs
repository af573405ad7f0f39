//! Stylesheet compilation for the style bundle.
//!
//! [`compile_file`] compiles the subset of LESS that application stylesheets
//! use: variables, interpolation, operations, nesting, `@media` bubbling,
//! imports and simple mixins. Anything else is a compile error. The
//! [`url`] module finds and rewrites `url(...)` references in plain CSS and
//! is shared with the fingerprinting stage.

#![warn(missing_docs)]

pub mod ast;
pub mod compile;
pub mod css;
pub mod error;
pub mod eval;
mod ops;
pub mod parser;
pub mod url;

pub use compile::{compile_file, compile_source};
pub use error::{LessError, LESS_ERROR};
pub use url::{
    extract_urls, is_rebasable, rebase_urls, rewrite_urls, split_query_and_fragment,
    strip_query_and_fragment,
};
