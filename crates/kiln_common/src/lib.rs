//! Shared foundational types used across the kiln asset build tool.
//!
//! This crate provides content hashing (asset fingerprints and cache digests)
//! and the normalized logical path type that identifies every asset.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{sha1_hex, ContentHash, FINGERPRINT_LEN};
pub use path::{LogicalPath, PathError};
