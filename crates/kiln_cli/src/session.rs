//! State shared by the tasks of one invocation.

use std::path::Path;

use kiln_cache::TransformCache;
use kiln_config::{load_config, resolve_project, Overrides, ResolvedProject};
use kiln_source::SourceDb;

use crate::GlobalArgs;

/// Version recorded in the transformation cache index. A cache written by
/// another version is discarded.
pub const KILN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The resolved project plus the state tasks share: every source file
/// registered for diagnostics, and the transformation cache once opened.
pub struct Session {
    /// Flags from the command line.
    pub global: GlobalArgs,
    /// Paths and settings.
    pub project: ResolvedProject,
    /// Sources that diagnostics may point into.
    pub db: SourceDb,
    cache: Option<TransformCache>,
}

impl Session {
    /// Loads `kiln.toml` and `package.json` from `dir`.
    pub fn open(
        dir: &Path,
        overrides: &Overrides,
        global: GlobalArgs,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = load_config(dir)?;
        let project = resolve_project(dir, &config, overrides)?;
        Ok(Self {
            global,
            project,
            db: SourceDb::new(),
            cache: None,
        })
    }

    /// Splits the session into what the pipeline functions take, opening
    /// the cache on first use.
    pub fn parts(&mut self) -> (&ResolvedProject, &mut SourceDb, &mut TransformCache) {
        let project = &self.project;
        let cache = self
            .cache
            .get_or_insert_with(|| TransformCache::load_or_create(&project.cache_dir, KILN_VERSION));
        (project, &mut self.db, cache)
    }

    /// The cache, if a task has opened it.
    pub fn open_cache(&mut self) -> Option<&mut TransformCache> {
        self.cache.as_mut()
    }

    /// Prints a progress line unless `--quiet` was given.
    pub fn status(&self, verb: &str, message: impl std::fmt::Display) {
        if !self.global.quiet {
            eprintln!("{verb:>12} {message}");
        }
    }
}
