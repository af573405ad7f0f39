//! Stable identifiers such as `E001` and `W003`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a code belongs to, shown as its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`: the input cannot be processed as written.
    Error,
    /// `W`: the input is processable but suspicious.
    Warning,
}

impl Category {
    /// Prefix letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A category plus a number, displayed zero-padded to three digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    /// Family of the code.
    pub category: Category,
    /// Number inside the family.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

// Codes travel as their display form ("W001") in JSON reports.
impl Serialize for DiagnosticCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DiagnosticCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let mut chars = raw.chars();
        let category = match chars.next() {
            Some('E') => Category::Error,
            Some('W') => Category::Warning,
            _ => return Err(serde::de::Error::custom(format!("bad code prefix in '{raw}'"))),
        };
        let number = chars
            .as_str()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("bad code number in '{raw}'")))?;
        Ok(Self { category, number })
    }
}
