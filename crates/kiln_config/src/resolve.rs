//! Merging `kiln.toml`, `package.json` and command-line overrides.

use crate::cdn::CdnBase;
use crate::error::ConfigError;
use crate::package::{module_name_from_package, read_package_name};
use crate::types::ProjectConfig;
use kiln_common::{LogicalPath, PathError};
use std::path::{Path, PathBuf};

/// Values given on the command line, which win over `kiln.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// `--cdn` / `KILN_CDN`.
    pub cdn: Option<String>,
    /// `--deny` rules.
    pub deny: Vec<String>,
    /// `--allow` rules.
    pub allow: Vec<String>,
}

/// Everything a task needs to know about the project, with absolute paths.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    /// Directory holding `kiln.toml` and `package.json`.
    pub project_dir: PathBuf,
    /// Root that logical asset paths are relative to.
    pub source_root: PathBuf,
    /// Build output directory.
    pub dist_dir: PathBuf,
    /// Transformation cache directory.
    pub cache_dir: PathBuf,
    /// Entry HTML page.
    pub entry_html: LogicalPath,
    /// LESS entry stylesheet.
    pub style_entry: LogicalPath,
    /// Script placed first in the bundle.
    pub entry_script: LogicalPath,
    /// Angular module the compiled templates register with.
    pub module_name: String,
    /// CDN base for manifest values.
    pub cdn: CdnBase,
    /// Extra script exclusion globs.
    pub script_excludes: Vec<String>,
    /// Rules reported as errors.
    pub lint_deny: Vec<String>,
    /// Rules not reported.
    pub lint_allow: Vec<String>,
}

impl ResolvedProject {
    /// Logical path of a filesystem path under the source root, if it is one.
    pub fn logical_path(&self, path: &Path) -> Option<LogicalPath> {
        LogicalPath::from_base(&self.source_root, path).ok()
    }
}

/// Builds a [`ResolvedProject`] for `project_dir`.
///
/// The module name comes from `build.module`, else the `package.json` name
/// with hyphens turned into dots, else the project directory name.
pub fn resolve_project(
    project_dir: &Path,
    config: &ProjectConfig,
    overrides: &Overrides,
) -> Result<ResolvedProject, ConfigError> {
    let project_dir = std::path::absolute(project_dir)?;
    let build = &config.build;

    let source_root = match LogicalPath::new(&build.source) {
        Ok(rel) => rel.to_fs_path(&project_dir),
        Err(PathError::Empty) => project_dir.clone(),
        Err(source) => return Err(invalid("build.source", source)),
    };
    let dist_dir = LogicalPath::new(&build.dist)
        .map_err(|e| invalid("build.dist", e))?
        .to_fs_path(&project_dir);
    if source_root.starts_with(&dist_dir) {
        return Err(ConfigError::ValidationError(
            "`build.dist` must not contain the source root".to_string(),
        ));
    }
    let cache_dir = LogicalPath::new(&config.cache.dir)
        .map_err(|e| invalid("cache.dir", e))?
        .to_fs_path(&project_dir);

    let module_name = match &build.module {
        Some(module) => module.clone(),
        None => match read_package_name(&project_dir)? {
            Some(name) => module_name_from_package(&name),
            None => project_dir
                .file_name()
                .map(|n| module_name_from_package(&n.to_string_lossy()))
                .ok_or_else(|| {
                    ConfigError::ValidationError(
                        "cannot derive a module name; set `build.module`".to_string(),
                    )
                })?,
        },
    };

    let cdn = CdnBase::new(overrides.cdn.as_deref().unwrap_or(&build.cdn));

    let mut lint_deny: Vec<String> = config.lint.deny.clone();
    let mut lint_allow: Vec<String> = config.lint.allow.clone();
    lint_deny.retain(|r| !overrides.allow.contains(r));
    lint_allow.retain(|r| !overrides.deny.contains(r));
    lint_deny.extend(overrides.deny.iter().cloned());
    lint_allow.extend(overrides.allow.iter().cloned());

    Ok(ResolvedProject {
        entry_html: LogicalPath::new(&build.entry_html)
            .map_err(|e| invalid("build.entry_html", e))?,
        style_entry: LogicalPath::new(&build.style_entry)
            .map_err(|e| invalid("build.style_entry", e))?,
        entry_script: LogicalPath::new(&build.entry_script)
            .map_err(|e| invalid("build.entry_script", e))?,
        project_dir,
        source_root,
        dist_dir,
        cache_dir,
        module_name,
        cdn,
        script_excludes: config.scripts.exclude.clone(),
        lint_deny,
        lint_allow,
    })
}

fn invalid(field: &str, source: PathError) -> ConfigError {
    ConfigError::InvalidPath {
        field: field.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn defaults_resolve_under_project_dir() {
        let dir = project(&[("package.json", r#"{"name":"shop-front"}"#)]);
        let resolved =
            resolve_project(dir.path(), &ProjectConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(resolved.source_root, resolved.project_dir);
        assert_eq!(resolved.dist_dir, resolved.project_dir.join("dist"));
        assert_eq!(resolved.cache_dir, resolved.project_dir.join(".kiln-cache"));
        assert_eq!(resolved.entry_html.as_str(), "index.html");
        assert_eq!(resolved.entry_script.as_str(), "main.js");
        assert_eq!(resolved.module_name, "shop.front");
        assert!(resolved.cdn.is_empty());
    }

    #[test]
    fn module_falls_back_to_directory_name() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("admin-console");
        std::fs::create_dir(&dir).unwrap();
        let resolved =
            resolve_project(&dir, &ProjectConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(resolved.module_name, "admin.console");
    }

    #[test]
    fn configured_module_wins() {
        let dir = project(&[("package.json", r#"{"name":"shop-front"}"#)]);
        let config = load_config_from_str("[build]\nmodule = \"custom\"\n").unwrap();
        let resolved = resolve_project(dir.path(), &config, &Overrides::default()).unwrap();
        assert_eq!(resolved.module_name, "custom");
    }

    #[test]
    fn cli_cdn_overrides_file() {
        let dir = project(&[]);
        let config = load_config_from_str("[build]\ncdn = \"https://a.example\"\n").unwrap();
        let from_file = resolve_project(dir.path(), &config, &Overrides::default()).unwrap();
        assert_eq!(from_file.cdn.as_str(), "https://a.example/");

        let overrides = Overrides {
            cdn: Some("https://b.example/".to_string()),
            ..Overrides::default()
        };
        let from_cli = resolve_project(dir.path(), &config, &overrides).unwrap();
        assert_eq!(from_cli.cdn.as_str(), "https://b.example/");
    }

    #[test]
    fn cli_lint_levels_override_file() {
        let dir = project(&[]);
        let config =
            load_config_from_str("[lint]\ndeny = [\"eqeqeq\"]\nallow = [\"no-eval\"]\n").unwrap();
        let overrides = Overrides {
            allow: vec!["eqeqeq".to_string()],
            deny: vec!["no-eval".to_string()],
            ..Overrides::default()
        };
        let resolved = resolve_project(dir.path(), &config, &overrides).unwrap();
        assert_eq!(resolved.lint_deny, vec!["no-eval"]);
        assert_eq!(resolved.lint_allow, vec!["eqeqeq"]);
    }

    #[test]
    fn escaping_paths_rejected() {
        let dir = project(&[]);
        let config = load_config_from_str("[build]\nentry_html = \"../index.html\"\n").unwrap();
        let err = resolve_project(dir.path(), &config, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn source_inside_dist_rejected() {
        let dir = project(&[]);
        let config =
            load_config_from_str("[build]\nsource = \"out/src\"\ndist = \"out\"\n").unwrap();
        let err = resolve_project(dir.path(), &config, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn logical_path_under_source_root() {
        let dir = project(&[]);
        let resolved =
            resolve_project(dir.path(), &ProjectConfig::default(), &Overrides::default()).unwrap();
        let p = resolved.logical_path(&resolved.source_root.join("app/x.js")).unwrap();
        assert_eq!(p.as_str(), "app/x.js");
    }
}
