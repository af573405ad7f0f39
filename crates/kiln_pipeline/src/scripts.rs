//! The script bundle: vendor scripts, application scripts and compiled
//! templates, minified one by one and joined into `app.js`.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::html::{load_references, script_sources};
use crate::select::FileSelector;
use glob::Pattern;
use kiln_cache::{CacheKey, TransformCache};
use kiln_common::LogicalPath;
use kiln_config::ResolvedProject;
use kiln_js::{compile_templates, concat_scripts, minify, Template};
use kiln_source::SourceDb;
use std::collections::HashSet;
use tracing::debug;

/// Name of the script bundle.
pub const SCRIPT_BUNDLE: &str = "app.js";
/// Name of the compiled template script.
pub const TEMPLATES_SCRIPT: &str = "templates.js";
/// Cache operation for minified scripts.
pub const MINIFY_OP: &str = "uglify";

/// The bundled scripts and what it took to produce them.
#[derive(Debug)]
pub struct ScriptBundle {
    /// `app.js`.
    pub asset: Asset,
    /// Scripts in bundle order.
    pub inputs: Vec<LogicalPath>,
    /// How many of them came from the cache.
    pub cached: usize,
}

/// Moves `entry` to the front, keeping the relative order of the rest.
pub fn order_scripts(mut scripts: Vec<Asset>, entry: &LogicalPath) -> Vec<Asset> {
    if let Some(idx) = scripts.iter().position(|s| &s.path == entry) {
        let first = scripts.remove(idx);
        scripts.insert(0, first);
    }
    scripts
}

/// Application scripts in selector order.
pub fn select_scripts(project: &ResolvedProject) -> Result<Vec<LogicalPath>, PipelineError> {
    let mut selector = FileSelector::for_project(project)?.include("**/*.js")?;
    for pattern in &project.script_excludes {
        selector = selector.exclude(pattern)?;
    }
    Ok(selector.select()?)
}

/// Compiles every HTML file except the entry page into the template script.
///
/// Returns `None` when there are no templates.
pub fn build_templates(project: &ResolvedProject) -> Result<Option<Asset>, PipelineError> {
    let paths = FileSelector::for_project(project)?
        .include("**/*.html")?
        .exclude(&Pattern::escape(project.entry_html.as_str()))?
        .select()?;
    if paths.is_empty() {
        return Ok(None);
    }
    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let asset = Asset::read(&project.source_root, path)?;
        debug!(target: "kiln::script", template = %asset.path, "adding template");
        templates.push(Template::new(asset.path.to_string(), asset.text()?));
    }
    let script = compile_templates(&project.module_name, &templates);
    Ok(Some(Asset::new(LogicalPath::new(TEMPLATES_SCRIPT)?, script)))
}

/// Builds `app.js`.
///
/// Vendor scripts referenced by the entry page come first, in page order,
/// then application scripts, then the compiled templates; the entry script
/// is moved to the very front. A file reachable several ways is bundled
/// once, at its first position. Each script is minified on its own and the
/// results are cached under `uglify|sha1(content)`.
pub fn build_scripts(
    project: &ResolvedProject,
    html: &str,
    db: &mut SourceDb,
    cache: &mut TransformCache,
) -> Result<ScriptBundle, PipelineError> {
    let bundle_path = LogicalPath::new(SCRIPT_BUNDLE)?;
    let templates_path = LogicalPath::new(TEMPLATES_SCRIPT)?;
    let vendors = load_references(
        &project.source_root,
        &project.entry_html,
        &script_sources(html),
        &[&bundle_path, &templates_path],
    )?;

    let mut scripts = vendors;
    for path in select_scripts(project)? {
        scripts.push(Asset::read(&project.source_root, path)?);
    }
    scripts.extend(build_templates(project)?);

    let mut seen = HashSet::new();
    scripts.retain(|s| seen.insert(s.path.clone()));
    let scripts = order_scripts(scripts, &project.entry_script);

    let mut fragments = Vec::with_capacity(scripts.len());
    let mut cached = 0;
    for script in &scripts {
        let key = CacheKey::new(MINIFY_OP, &script.content);
        let (bytes, hit) = cache.get_or_compute::<PipelineError, _>(&key, || {
            let file = db.add_source(script.path.to_string(), script.text()?.to_string());
            minify(&db.get_file(file).content, file)
                .map(String::into_bytes)
                .map_err(|source| PipelineError::Minify {
                    path: script.path.clone(),
                    source,
                })
        })?;
        debug!(target: "kiln::script", script = %script.path, cached = hit, "minified");
        cached += usize::from(hit);
        fragments.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(ScriptBundle {
        asset: Asset::new(bundle_path, concat_scripts(&fragments)),
        inputs: scripts.into_iter().map(|s| s.path).collect(),
        cached,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{project, write};

    fn js(path: &str) -> Asset {
        Asset::new(LogicalPath::new(path).unwrap(), "")
    }

    #[test]
    fn entry_script_goes_first() {
        let ordered = order_scripts(
            vec![js("b.js"), js("a.js"), js("main.js")],
            &LogicalPath::new("main.js").unwrap(),
        );
        let names: Vec<&str> = ordered.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(names, vec!["main.js", "b.js", "a.js"]);
    }

    #[test]
    fn missing_entry_keeps_order() {
        let ordered = order_scripts(
            vec![js("b.js"), js("a.js")],
            &LogicalPath::new("main.js").unwrap(),
        );
        let names: Vec<&str> = ordered.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(names, vec!["b.js", "a.js"]);
    }

    #[test]
    fn bundles_vendors_scripts_and_templates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "index.html",
            r#"<script src="lib/vendor.js"></script><script src="app.js"></script>"#,
        );
        write(root, "lib/vendor.js", "var vendor = 1; // lib\n");
        write(root, "main.js", "angular.module('test.app', []);\n");
        write(root, "app/ctrl.js", "function ctrl() {\n  return 1;\n}\n");
        write(root, "app/ctrl.min.js", "ignored();");
        write(root, "views/home.html", "<p>home</p>");
        write(root, "node_modules/x/y.js", "ignored();");

        let mut project = project(root);
        project.script_excludes = vec!["**/*.min.js".to_string()];
        let mut db = SourceDb::new();
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");

        let html = std::fs::read_to_string(root.join("index.html")).unwrap();
        let bundle = build_scripts(&project, &html, &mut db, &mut cache).unwrap();
        let inputs: Vec<&str> = bundle.inputs.iter().map(LogicalPath::as_str).collect();
        assert_eq!(
            inputs,
            vec!["main.js", "lib/vendor.js", "app/ctrl.js", "templates.js"]
        );
        assert_eq!(bundle.asset.path.as_str(), "app.js");
        let out = bundle.asset.text().unwrap();
        assert!(out.starts_with("angular.module('test.app',[]);;var vendor=1;;"));
        let ctrl = out.find("function ctrl(){return 1}").unwrap();
        let templates = out
            .find(r#"$templateCache.put("views/home.html","<p>home</p>")"#)
            .unwrap();
        assert!(ctrl < templates);
        assert!(!out.contains("ignored"));
        assert_eq!(bundle.cached, 0);
    }

    #[test]
    fn unchanged_scripts_come_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "main.js", "var a = 1;\n");
        write(root, "other.js", "var b = 2;\n");
        let project = project(root);

        let mut db = SourceDb::new();
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let first = build_scripts(&project, "", &mut db, &mut cache).unwrap();
        assert_eq!(first.cached, 0);
        cache.save().unwrap();

        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let second = build_scripts(&project, "", &mut db, &mut cache).unwrap();
        assert_eq!(second.cached, 2);
        assert_eq!(second.asset, first.asset);
    }

    #[test]
    fn malformed_script_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.js", "function f( {\n");
        let project = project(dir.path());
        let mut db = SourceDb::new();
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let err = build_scripts(&project, "", &mut db, &mut cache).unwrap_err();
        assert!(matches!(&err, PipelineError::Minify { path, .. } if path.as_str() == "main.js"));
        assert!(!err.diagnostics().is_empty());
    }
}
