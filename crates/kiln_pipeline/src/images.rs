//! Static images plus every file the style bundle points at.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::select::FileSelector;
use kiln_common::path::join_dir;
use kiln_common::LogicalPath;
use kiln_config::ResolvedProject;
use kiln_less::{extract_urls, is_rebasable, strip_query_and_fragment};
use std::collections::HashSet;
use tracing::debug;

/// Patterns of static image files, in selection order.
pub const IMAGE_PATTERNS: &[&str] = &["**/*.png", "**/*.jpg", "**/*.gif", "**/*.svg", "**/*.ico"];

/// Logical paths referenced by `url()`s in a stylesheet.
///
/// Query strings and fragments are dropped and duplicates removed. `data:`
/// URIs, absolute URLs and references leaving the source root are skipped.
pub fn stylesheet_references(css: &Asset) -> Result<Vec<(String, LogicalPath)>, PipelineError> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for url in extract_urls(css.text()?) {
        let path = strip_query_and_fragment(&url);
        if !is_rebasable(path) {
            continue;
        }
        let Ok(logical) = join_dir(css.path.dir(), path) else {
            continue;
        };
        if seen.insert(logical.clone()) {
            refs.push((url, logical));
        }
    }
    Ok(refs)
}

/// Collects the static images and the files referenced by `css`.
///
/// A file referenced from the stylesheet that does not exist is fatal.
pub fn collect_images(
    project: &ResolvedProject,
    css: Option<&Asset>,
) -> Result<Vec<Asset>, PipelineError> {
    let mut selector = FileSelector::for_project(project)?;
    for pattern in IMAGE_PATTERNS {
        selector = selector.include(pattern)?;
    }
    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for path in selector.select()? {
        seen.insert(path.clone());
        images.push(Asset::read(&project.source_root, path)?);
    }

    if let Some(css) = css {
        for (reference, path) in stylesheet_references(css)? {
            if !seen.insert(path.clone()) {
                continue;
            }
            if !path.to_fs_path(&project.source_root).is_file() {
                return Err(PipelineError::MissingImage { reference, path });
            }
            debug!(target: "kiln::image", image = %path, "referenced from stylesheet");
            images.push(Asset::read(&project.source_root, path)?);
        }
    }
    debug!(target: "kiln::image", count = images.len(), "collected images");
    Ok(images)
}
