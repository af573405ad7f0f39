//! Reading `kiln.toml`.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Loads `<project_dir>/kiln.toml`, or the defaults when the file is absent.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    match std::fs::read_to_string(&config_path) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProjectConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    let build = &config.build;
    for (field, value) in [
        ("build.dist", &build.dist),
        ("build.entry_html", &build.entry_html),
        ("build.style_entry", &build.style_entry),
        ("build.entry_script", &build.entry_script),
        ("cache.dir", &config.cache.dir),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("`{field}` must not be empty")));
        }
    }
    if build.dist.trim_matches('/') == "." {
        return Err(ConfigError::ValidationError(
            "`build.dist` must not be the project directory".to_string(),
        ));
    }
    if let Some(module) = &build.module {
        if module.is_empty() {
            return Err(ConfigError::ValidationError(
                "`build.module` must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
