//! JavaScript handling for the script bundle.
//!
//! The [`lexer`] turns source text into [`Token`]s that record whether a
//! line break preceded them. The [`minify`](mod@minify) module drops comments
//! and insignificant whitespace from that stream, [`concat`] joins minified
//! fragments into one bundle and [`templates`] compiles HTML templates into a
//! script that preloads Angular's `$templateCache`.

#![warn(missing_docs)]

pub mod balance;
pub mod concat;
pub mod lexer;
pub mod minify;
pub mod templates;
pub mod token;

pub use balance::check_brackets;
pub use concat::concat_scripts;
pub use lexer::{lex, SYNTAX_ERROR};
pub use minify::{minify, MinifyError};
pub use templates::{compile_templates, Template};
pub use token::{is_keyword, is_restricted_keyword, is_value_keyword, JsToken, Token};
