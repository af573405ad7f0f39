//! The `build` and `copy` tasks.
//!
//! `build` runs the three pipelines, fingerprints their outputs, writes them
//! with the manifest to the output directory and finally writes the entry
//! page with its references pointing at the fingerprinted names.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::html::rewrite_references;
use crate::images::collect_images;
use crate::rev::{fingerprint, RevAsset, RevManifest, MANIFEST_FILE};
use crate::scripts::build_scripts;
use crate::styles::build_styles;
use kiln_cache::TransformCache;
use kiln_common::LogicalPath;
use kiln_config::ResolvedProject;
use kiln_source::SourceDb;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a build produced.
#[derive(Debug)]
pub struct BuildReport {
    /// Written assets, original name and fingerprinted name.
    pub outputs: Vec<(LogicalPath, LogicalPath)>,
    /// The manifest written next to them.
    pub manifest: RevManifest,
    /// Scripts bundled into `app.js`.
    pub scripts: usize,
    /// Of those, how many were minified from cache.
    pub scripts_cached: usize,
}

/// Runs a full build into the project's output directory.
pub fn build(
    project: &ResolvedProject,
    db: &mut SourceDb,
    cache: &mut TransformCache,
) -> Result<BuildReport, PipelineError> {
    let html = Asset::read(&project.source_root, project.entry_html.clone())?;
    let page = html.text()?;

    // Minified scripts are stored as they are produced; the index is saved
    // even when a later script fails so those entries are not orphaned.
    let scripts = build_scripts(project, page, db, cache);
    let saved = cache.save().and_then(|()| cache.gc());
    let scripts = scripts?;
    saved?;
    let styles = build_styles(project, page, db)?;
    let images = collect_images(project, styles.as_ref())?;

    let mut assets = vec![scripts.asset];
    assets.extend(styles);
    assets.extend(images);
    let revs = fingerprint(assets)?;
    for rev in &revs {
        write_file(&project.dist_dir, &rev.asset.path, &rev.asset.content)?;
    }

    let manifest = RevManifest::from_assets(&revs, &project.cdn);
    let manifest_path = LogicalPath::new(MANIFEST_FILE)?;
    write_file(&project.dist_dir, &manifest_path, manifest.to_json()?.as_bytes())?;

    let rewritten = rewrite_references(page, &manifest);
    write_file(&project.dist_dir, &html.path, rewritten.as_bytes())?;

    Ok(BuildReport {
        outputs: revs
            .into_iter()
            .map(|RevAsset { original, asset }| (original, asset.path))
            .collect(),
        manifest,
        scripts: scripts.inputs.len(),
        scripts_cached: scripts.cached,
    })
}

/// Copies the entry page unchanged into the output directory.
pub fn copy_entry(project: &ResolvedProject) -> Result<PathBuf, PipelineError> {
    let html = Asset::read(&project.source_root, project.entry_html.clone())?;
    write_file(&project.dist_dir, &html.path, &html.content)
}

fn write_file(dist: &Path, path: &LogicalPath, content: &[u8]) -> Result<PathBuf, PipelineError> {
    let target = path.to_fs_path(dist);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(&target, content).map_err(|e| PipelineError::io(&target, e))?;
    debug!(target: "kiln::dist", file = %path, bytes = content.len(), "wrote");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{project, write};
    use kiln_config::CdnBase;
    use std::fs;

    fn sample_project(root: &Path) {
        write(
            root,
            "index.html",
            r#"<html><head><link rel="stylesheet" href="lib/reset.css"><link rel="stylesheet" href="app.css"></head>
<body><img src="img/logo.png"><script src="lib/vendor.js"></script><script src="app.js"></script></body></html>
"#,
        );
        write(root, "lib/reset.css", "html { margin: 0; }\n");
        write(root, "lib/vendor.js", "window.vendor = true;\n");
        write(root, "main.js", "angular.module('test.app', []);\n");
        write(root, "app/home.js", "function home() {\n  return 'home';\n}\n");
        write(root, "views/home.html", "<h1>Home</h1>\n");
        write(root, "main.less", "@bg: url('img/bg.png?v=3');\nbody { background: @bg; }\n");
        write(root, "img/bg.png", "BG");
        write(root, "img/logo.png", "LOGO");
    }

    fn fingerprinted(report: &BuildReport, original: &str) -> String {
        report
            .outputs
            .iter()
            .find(|(o, _)| o.as_str() == original)
            .map(|(_, f)| f.to_string())
            .unwrap()
    }

    #[test]
    fn end_to_end_build() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        sample_project(root);
        let mut project = project(root);
        project.cdn = CdnBase::new("https://cdn.example.com");

        let mut db = SourceDb::new();
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let report = build(&project, &mut db, &mut cache).unwrap();

        let originals: Vec<&str> = report.outputs.iter().map(|(o, _)| o.as_str()).collect();
        assert_eq!(originals, vec!["app.js", "app.css", "img/bg.png", "img/logo.png"]);
        assert_eq!(report.scripts, 4);

        let dist = &project.dist_dir;
        let app_js = fingerprinted(&report, "app.js");
        let app_css = fingerprinted(&report, "app.css");
        let bg = fingerprinted(&report, "img/bg.png");
        let logo = fingerprinted(&report, "img/logo.png");
        for name in [&app_js, &app_css, &bg, &logo] {
            assert!(dist.join(name).is_file(), "{name} written");
        }

        let css = fs::read_to_string(dist.join(&app_css)).unwrap();
        assert!(css.starts_with("html { margin: 0; }\n"));
        assert!(css.contains(&format!("url('{bg}?v=3')")));

        let js = fs::read_to_string(dist.join(&app_js)).unwrap();
        assert!(js.starts_with("angular.module('test.app',[]);;window.vendor=true;"));
        assert!(js.contains(r#"$templateCache.put("views/home.html","<h1>Home</h1>\n")"#));

        let manifest = fs::read_to_string(dist.join("rev-manifest.json")).unwrap();
        assert!(manifest.starts_with("{\n    \"app.css\": \"https://cdn.example.com/app-"));
        assert_eq!(report.manifest.get("img/logo.png").unwrap(), format!("https://cdn.example.com/{logo}"));

        let html = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(html.contains(&format!(r#"<script src="https://cdn.example.com/{app_js}">"#)));
        assert!(html.contains(&format!(r#"href="https://cdn.example.com/{app_css}">"#)));
        assert!(html.contains(&format!(r#"<img src="https://cdn.example.com/{logo}">"#)));
        assert!(html.contains(r#"href="lib/reset.css""#));
        assert!(html.contains(r#"src="lib/vendor.js""#));
    }

    #[test]
    fn rebuild_is_deterministic_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let project = project(dir.path());

        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let first = build(&project, &mut SourceDb::new(), &mut cache).unwrap();
        assert_eq!(first.scripts_cached, 0);

        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let second = build(&project, &mut SourceDb::new(), &mut cache).unwrap();
        assert_eq!(second.scripts_cached, second.scripts);
        assert_eq!(first.outputs, second.outputs);
    }

    #[test]
    fn failed_build_keeps_cache_consistent() {
        use kiln_cache::artifact::ArtifactStore;
        use kiln_cache::CacheKey;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.html", r#"<script src="app.js"></script>"#);
        write(root, "main.js", "var a = 1;\n");
        write(root, "z.js", "function (\n");
        let project = project(root);
        let stray = CacheKey::new("uglify", b"left over from an interrupted run");
        ArtifactStore::new(&project.cache_dir)
            .write_artifact(&stray, b"x", "test")
            .unwrap();

        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let err = build(&project, &mut SourceDb::new(), &mut cache).unwrap_err();
        assert!(matches!(&err, PipelineError::Minify { path, .. } if path.as_str() == "z.js"));

        let artifacts = fs::read_dir(project.cache_dir.join("uglify")).unwrap().count();
        assert_eq!(artifacts, 1);
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let main = CacheKey::new("uglify", b"var a = 1;\n");
        assert_eq!(cache.get(&main).unwrap(), b"var a=1;");
        assert!(cache.get(&stray).is_none());
    }

    #[test]
    fn copy_writes_entry_page() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<p>hi</p>");
        let project = project(dir.path());
        let written = copy_entry(&project).unwrap();
        assert_eq!(written, project.dist_dir.join("index.html"));
        assert_eq!(fs::read_to_string(written).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn missing_entry_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(dir.path());
        let mut cache = TransformCache::load_or_create(&project.cache_dir, "test");
        let err = build(&project, &mut SourceDb::new(), &mut cache).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
