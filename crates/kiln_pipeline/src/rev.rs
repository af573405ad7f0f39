//! Content fingerprinting and the rev-manifest.
//!
//! Every output is renamed `dir/name-<hash>.ext`, the hash being the first
//! ten hex digits of the XXH3-128 of its final bytes. Stylesheets are hashed
//! last, after their `url()` references have been pointed at the renamed
//! files, so a changed image also changes the name of the CSS using it.

use crate::asset::Asset;
use crate::error::PipelineError;
use kiln_common::path::join_dir;
use kiln_common::LogicalPath;
use kiln_config::CdnBase;
use kiln_less::{is_rebasable, rewrite_urls, split_query_and_fragment};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// File name of the manifest in the output directory.
pub const MANIFEST_FILE: &str = "rev-manifest.json";

/// An output asset under its fingerprinted name.
#[derive(Debug, Clone)]
pub struct RevAsset {
    /// Name before fingerprinting.
    pub original: LogicalPath,
    /// The asset, `path` being the fingerprinted name.
    pub asset: Asset,
}

/// Fingerprints `assets`, rewriting stylesheet references to the new names.
///
/// The result keeps the input order.
pub fn fingerprint(assets: Vec<Asset>) -> Result<Vec<RevAsset>, PipelineError> {
    let mut renamed: HashMap<LogicalPath, LogicalPath> = HashMap::new();
    let mut slots: Vec<Option<RevAsset>> = Vec::with_capacity(assets.len());
    let mut stylesheets = Vec::new();

    for (idx, asset) in assets.into_iter().enumerate() {
        if asset.is_css() {
            stylesheets.push((idx, asset));
            slots.push(None);
        } else {
            let rev = rename(asset);
            renamed.insert(rev.original.clone(), rev.asset.path.clone());
            slots.push(Some(rev));
        }
    }

    for (idx, mut sheet) in stylesheets {
        let dir = sheet.path.dir().to_string();
        let css = rewrite_urls(sheet.text()?, |url| {
            if !is_rebasable(url) {
                return None;
            }
            let (path, suffix) = split_query_and_fragment(url);
            let target = join_dir(&dir, path).ok()?;
            let hashed = renamed.get(&target)?;
            Some(format!("{}{suffix}", hashed.relative_from(&dir)))
        });
        sheet.content = css.into_bytes();
        slots[idx] = Some(rename(sheet));
    }

    Ok(slots.into_iter().flatten().collect())
}

fn rename(asset: Asset) -> RevAsset {
    let hashed = asset.path.with_fingerprint(&asset.hash().fingerprint());
    debug!(target: "kiln::rev", from = %asset.path, to = %hashed, "fingerprinted");
    RevAsset {
        original: asset.path.clone(),
        asset: Asset {
            path: hashed,
            content: asset.content,
        },
    }
}

/// Original asset name to fingerprinted (and CDN-prefixed) name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RevManifest {
    entries: BTreeMap<String, String>,
}

impl RevManifest {
    /// Builds the manifest of a set of fingerprinted assets.
    pub fn from_assets(assets: &[RevAsset], cdn: &CdnBase) -> Self {
        let entries = assets
            .iter()
            .map(|rev| (rev.original.to_string(), rev.asset.path.to_string()))
            .collect();
        Self::from_entries(entries, cdn)
    }

    /// Builds a manifest from raw pairs, prefixing each value with `cdn`.
    pub fn from_entries(entries: BTreeMap<String, String>, cdn: &CdnBase) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key, cdn.prefix(&value)))
            .collect();
        Self { entries }
    }

    /// The value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the manifest as a JSON object indented by four spaces.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
