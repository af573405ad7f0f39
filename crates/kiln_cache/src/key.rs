//! Cache keys of the form `operation|sha1`.

use kiln_common::sha1_hex;
use std::fmt;
use std::str::FromStr;

/// Identifies one transformation of one input.
///
/// Displayed as `operation|digest`, for example
/// `uglify|a9993e364706816aba3e25717850c26c9cd0d89d`. The same bytes under
/// different operations never share an entry.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CacheKey {
    op: String,
    digest: String,
}

impl CacheKey {
    /// Keys `input` under `op`, hashing it with SHA-1.
    pub fn new(op: &str, input: &[u8]) -> Self {
        Self::from_digest(op, sha1_hex(input))
    }

    /// Keys an already computed hex SHA-1 digest under `op`.
    pub fn from_digest(op: &str, digest: impl Into<String>) -> Self {
        Self {
            op: op.to_string(),
            digest: digest.into(),
        }
    }

    /// The operation name.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// The hex digest of the input.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.op, self.digest)
    }
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (op, digest) = s
            .split_once('|')
            .ok_or_else(|| format!("cache key '{s}' has no '|'"))?;
        let valid_op = !op.is_empty()
            && op
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        let valid_digest = !digest.is_empty() && digest.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid_op || !valid_digest {
            return Err(format!("malformed cache key '{s}'"));
        }
        Ok(Self::from_digest(op, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_op_pipe_sha1() {
        let key = CacheKey::new("uglify", b"abc");
        assert_eq!(key.to_string(), "uglify|a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(key.op(), "uglify");
    }

    #[test]
    fn same_input_different_ops() {
        let a = CacheKey::new("uglify", b"var a = 1;");
        let b = CacheKey::new("jshint", b"var a = 1;");
        assert_ne!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn parse_display_form() {
        let key: CacheKey = "jshint|0a1b".parse().unwrap();
        assert_eq!(key, CacheKey::from_digest("jshint", "0a1b"));
        assert!("nopipe".parse::<CacheKey>().is_err());
        assert!("../x|00".parse::<CacheKey>().is_err());
        assert!("op|zz".parse::<CacheKey>().is_err());
    }
}
