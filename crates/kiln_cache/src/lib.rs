//! Persistent transformation cache.
//!
//! Expensive per-file transformations (minification, lint passes) are keyed
//! by `operation|sha1(input)`. A [`TransformCache`] maps such a [`CacheKey`]
//! to the bytes the operation produced last time it saw identical input, so
//! unchanged files skip the work on later invocations. The cache lives in one
//! directory and survives until explicitly cleared.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod error;
pub mod index;
pub mod key;

pub use cache::{clear_dir, CacheStats, TransformCache};
pub use error::CacheError;
pub use key::CacheKey;
