//! The style bundle: vendor stylesheets from the entry page followed by the
//! compiled LESS entry, joined into `app.css`.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::html::{load_references, stylesheet_hrefs};
use kiln_common::LogicalPath;
use kiln_config::ResolvedProject;
use kiln_less::{compile_file, rebase_urls};
use kiln_source::SourceDb;
use tracing::debug;

/// Name of the style bundle.
pub const STYLE_BUNDLE: &str = "app.css";

/// Builds `app.css`.
///
/// Relative `url()`s of every part are rebased so they resolve from the
/// source root, where the bundle is written. A missing LESS entry is not an
/// error. Returns `None` when there is neither a vendor stylesheet nor a
/// LESS entry.
pub fn build_styles(
    project: &ResolvedProject,
    html: &str,
    db: &mut SourceDb,
) -> Result<Option<Asset>, PipelineError> {
    let bundle_path = LogicalPath::new(STYLE_BUNDLE)?;
    let vendors = load_references(
        &project.source_root,
        &project.entry_html,
        &stylesheet_hrefs(html),
        &[&bundle_path],
    )?;

    let mut parts = Vec::with_capacity(vendors.len() + 1);
    for vendor in &vendors {
        debug!(target: "kiln::style", stylesheet = %vendor.path, "adding vendor stylesheet");
        parts.push(rebase_urls(vendor.text()?, vendor.path.dir()));
    }

    let entry = project.style_entry.to_fs_path(&project.source_root);
    if entry.is_file() {
        let css = compile_file(db, &entry)?;
        parts.push(rebase_urls(&css, project.style_entry.dir()));
    } else {
        debug!(target: "kiln::style", entry = %project.style_entry, "no stylesheet entry");
    }

    if parts.is_empty() {
        return Ok(None);
    }
    let css = parts
        .iter()
        .map(|p| p.trim_end())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Some(Asset::new(bundle_path, css + "\n")))
}
