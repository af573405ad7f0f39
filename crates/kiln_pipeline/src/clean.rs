//! Removing previous build output.

use crate::error::PipelineError;
use std::path::Path;
use tracing::debug;

/// Deletes everything inside `dist_dir`, keeping the directory itself.
///
/// Returns the number of files removed. A missing directory is fine.
pub fn clean(dist_dir: &Path) -> Result<usize, PipelineError> {
    if !dist_dir.is_dir() {
        return Ok(0);
    }
    let removed = remove_contents(dist_dir)?;
    debug!(target: "kiln::dist", dir = %dist_dir.display(), removed, "cleaned output");
    Ok(removed)
}

fn remove_contents(dir: &Path) -> Result<usize, PipelineError> {
    let mut removed = 0;
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_dir() {
            removed += remove_contents(&path)?;
            std::fs::remove_dir(&path).map_err(|e| PipelineError::io(&path, e))?;
        } else {
            std::fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}
