//! CDN base URLs prefixed to fingerprinted asset names.

use std::fmt;

/// A CDN base URL, normalized to end in exactly one `/`, or empty for none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CdnBase(String);

impl CdnBase {
    /// Normalizes `raw`. Surrounding whitespace is ignored and trailing
    /// slashes collapse to one.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            Self(String::new())
        } else {
            Self(format!("{trimmed}/"))
        }
    }

    /// Returns `true` when no CDN is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized base, including its trailing slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefixes an asset path with the base, joined by a single slash.
    pub fn prefix(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{}{}", self.0, path.trim_start_matches('/'))
        }
    }
}

impl fmt::Display for CdnBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
