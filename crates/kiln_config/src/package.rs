//! Module name lookup in `package.json`.

use crate::error::ConfigError;
use std::path::Path;

/// Reads the `name` field of `<dir>/package.json`.
///
/// Returns `Ok(None)` when the file is missing or has no string `name`.
pub fn read_package_name(dir: &Path) -> Result<Option<String>, ConfigError> {
    let content = match std::fs::read_to_string(dir.join("package.json")) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::PackageJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ConfigError::PackageJson("expected a JSON object".to_string()));
    }
    Ok(value
        .get("name")
        .and_then(|n| n.as_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string))
}

/// Turns a package name into a template module name: `my-app` becomes `my.app`.
pub fn module_name_from_package(name: &str) -> String {
    name.replace('-', ".")
}
