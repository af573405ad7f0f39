//! The build tasks of a single-page application.
//!
//! Three pipelines turn the source tree into a handful of output assets:
//!
//! - [`scripts`]: vendor scripts from the entry page, application scripts
//!   and compiled HTML templates, minified and joined into `app.js`.
//! - [`styles`]: vendor stylesheets from the entry page and the compiled
//!   LESS entry, joined into `app.css`.
//! - [`images`]: static images plus everything `app.css` points at.
//!
//! [`rev`] fingerprints the outputs and builds the manifest that
//! [`html::rewrite_references`] applies to the entry page. [`build()`] ties
//! it together; [`clean()`], [`copy_entry`] and [`lint_scripts`] implement
//! the remaining tasks.

#![warn(missing_docs)]

pub mod asset;
pub mod build;
pub mod clean;
pub mod error;
pub mod html;
pub mod images;
pub mod lint;
pub mod rev;
pub mod scripts;
pub mod select;
pub mod styles;

pub use asset::Asset;
pub use build::{build, copy_entry, BuildReport};
pub use clean::clean;
pub use error::{PipelineError, SelectError};
pub use lint::{lint_engine, lint_scripts, LintReport, LINT_OP};
pub use rev::{fingerprint, RevAsset, RevManifest, MANIFEST_FILE};
pub use scripts::{order_scripts, MINIFY_OP, SCRIPT_BUNDLE};
pub use select::FileSelector;
pub use styles::STYLE_BUNDLE;
