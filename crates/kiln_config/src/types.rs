//! Configuration types deserialized from `kiln.toml`.
//!
//! Every section and field is optional. An absent file behaves exactly like
//! an empty one.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// The whole `kiln.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Layout of the project and build output.
    #[serde(default)]
    pub build: BuildConfig,
    /// Script selection.
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Transformation cache location.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Lint rule levels.
    #[serde(default)]
    pub lint: LintConfig,
}

/// The `[build]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BuildConfig {
    /// Source root, relative to the project directory.
    pub source: String,
    /// Output directory, relative to the project directory.
    pub dist: String,
    /// Entry HTML page, relative to the source root.
    pub entry_html: String,
    /// LESS entry stylesheet, relative to the source root.
    pub style_entry: String,
    /// Script that is always placed first in the bundle.
    pub entry_script: String,
    /// Template cache module name. Derived from `package.json` when unset.
    pub module: Option<String>,
    /// CDN base URL prefixed to manifest values.
    pub cdn: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: ".".to_string(),
            dist: "dist".to_string(),
            entry_html: "index.html".to_string(),
            style_entry: "main.less".to_string(),
            entry_script: "main.js".to_string(),
            module: None,
            cdn: String::new(),
        }
    }
}

/// The `[scripts]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    /// Extra glob patterns removed from script selection.
    ///
    /// Accepts a single string or a list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub exclude: Vec<String>,
}

/// The `[cache]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    /// Cache directory, relative to the project directory.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: ".kiln-cache".to_string(),
        }
    }
}

/// The `[lint]` section. Entries are rule names (`eqeqeq`) or codes (`W001`).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    /// Rules reported as errors.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Rules not reported at all.
    #[serde(default)]
    pub allow: Vec<String>,
}

fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a glob pattern or a list of glob patterns")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut patterns = Vec::new();
            while let Some(p) = seq.next_element::<String>()? {
                patterns.push(p);
            }
            Ok(patterns)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
