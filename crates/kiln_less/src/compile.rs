//! Entry points: loading a stylesheet, inlining its imports and printing the
//! evaluated result.

use crate::ast::{Import, Node};
use crate::css;
use crate::error::LessError;
use crate::eval::evaluate;
use crate::parser::{parse, SyntaxError};
use crate::url::{is_rebasable, rewrite_urls, split_query_and_fragment};
use kiln_source::{FileId, SourceDb};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compiles the LESS file at `path`.
///
/// Every file read is registered in `db`, so the spans of a returned error
/// can be rendered as a diagnostic.
pub fn compile_file(db: &mut SourceDb, path: &Path) -> Result<String, LessError> {
    let file = db.load_file(path).map_err(|source| LessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    compile_loaded(db, file)
}

/// Compiles in-memory LESS source. Imports resolve relative to `path`.
pub fn compile_source(
    db: &mut SourceDb,
    path: impl Into<PathBuf>,
    source: String,
) -> Result<String, LessError> {
    let file = db.add_source(path, source);
    compile_loaded(db, file)
}

fn compile_loaded(db: &mut SourceDb, file: FileId) -> Result<String, LessError> {
    let entry = db.get_file(file).path.clone();
    let entry_key = identity(&entry);
    let mut loader = Loader {
        db: &mut *db,
        entry_dir: entry.parent().map(Path::to_path_buf).unwrap_or_default(),
        stack: vec![entry_key.clone()],
        imported: HashSet::from([entry_key]),
    };
    let nodes = loader.load(file, "")?;
    let imports = loader.imported.len() - 1;

    let (statements, rules) = evaluate(&nodes, db)?;
    debug!(target: "kiln::style", entry = %entry.display(), imports, "compiled stylesheet");
    Ok(css::print(&statements, &rules))
}

struct Loader<'db> {
    db: &'db mut SourceDb,
    entry_dir: PathBuf,
    /// Files currently being loaded, outermost first.
    stack: Vec<PathBuf>,
    /// Every file loaded so far. A file is inlined at its first import only.
    imported: HashSet<PathBuf>,
}

impl Loader<'_> {
    /// Parses `file` and inlines its imports. `rel_dir` is the file's
    /// directory relative to the entry file, used to relocate `url()`s.
    fn load(&mut self, file: FileId, rel_dir: &str) -> Result<Vec<Node>, LessError> {
        let mut nodes = parse(&self.db.get_file(file).content, file)
            .map_err(|e| self.syntax_error(e))?;
        self.expand(&mut nodes, file, rel_dir)?;
        Ok(nodes)
    }

    fn expand(&mut self, nodes: &mut Vec<Node>, file: FileId, rel_dir: &str) -> Result<(), LessError> {
        let mut expanded = Vec::with_capacity(nodes.len());
        for node in std::mem::take(nodes) {
            match node {
                Node::Import(import) => expanded.extend(self.import(&import, file)?),
                Node::Rule(mut rule) => {
                    self.expand(&mut rule.children, file, rel_dir)?;
                    expanded.push(Node::Rule(rule));
                }
                Node::AtRule(mut at) => {
                    self.expand(&mut at.children, file, rel_dir)?;
                    expanded.push(Node::AtRule(at));
                }
                Node::Declaration(mut decl) => {
                    decl.value = relocate_urls(&decl.value, rel_dir);
                    expanded.push(Node::Declaration(decl));
                }
                Node::Variable(mut var) => {
                    var.value = relocate_urls(&var.value, rel_dir);
                    expanded.push(Node::Variable(var));
                }
                other => expanded.push(other),
            }
        }
        *nodes = expanded;
        Ok(())
    }

    fn import(&mut self, import: &Import, from: FileId) -> Result<Vec<Node>, LessError> {
        let from_path = self.db.get_file(from).path.clone();
        let mut target = from_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&import.path);
        if target.extension().is_none() {
            target.set_extension("less");
        }
        if !target.is_file() {
            return Err(LessError::MissingImport {
                path: import.path.clone(),
                span: import.span,
                location: self.db.resolve_span(import.span),
            });
        }

        let key = identity(&target);
        if self.stack.contains(&key) {
            return Err(LessError::ImportCycle {
                path: import.path.clone(),
                span: import.span,
                location: self.db.resolve_span(import.span),
            });
        }
        if !self.imported.insert(key.clone()) {
            debug!(target: "kiln::style", path = %target.display(), "skipping repeated import");
            return Ok(Vec::new());
        }

        let file = self.db.load_file(&target).map_err(|source| LessError::Io {
            path: target.clone(),
            source,
        })?;
        let rel_dir = target
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.entry_dir).ok())
            .map(|rel| join_relative("", &rel.to_string_lossy().replace('\\', "/")))
            .unwrap_or_default();
        debug!(target: "kiln::style", path = %target.display(), rel_dir = %rel_dir, "inlining import");

        self.stack.push(key);
        let nodes = self.load(file, &rel_dir);
        self.stack.pop();
        nodes
    }

    fn syntax_error(&self, e: SyntaxError) -> LessError {
        LessError::Syntax {
            location: self.db.resolve_span(e.span),
            message: e.message,
            span: e.span,
        }
    }
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Rewrites relative `url()`s of an imported file so they resolve from the
/// entry file's directory.
fn relocate_urls(value: &str, rel_dir: &str) -> String {
    if rel_dir.is_empty() {
        return value.to_string();
    }
    rewrite_urls(value, |url| {
        if !is_rebasable(url) || url.contains('@') {
            return None;
        }
        let (path, suffix) = split_query_and_fragment(url);
        Some(format!("{}{suffix}", join_relative(rel_dir, path)))
    })
}

/// Joins slash-separated relative paths, folding `.` and `..` where possible
/// and keeping leading `..` segments.
fn join_relative(dir: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in dir.split('/').chain(relative.split('/')) {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn compile(src: &str) -> Result<String, LessError> {
        let mut db = SourceDb::new();
        compile_source(&mut db, "main.less", src.to_string())
    }

    fn write(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn variables_and_nesting() {
        let src = "@color: #333;\n@pad: 4px;\n.nav {\n  color: @color;\n  a {\n    padding: @pad @pad;\n    &:hover { color: red; }\n  }\n}\n";
        assert_eq!(
            compile(src).unwrap(),
            ".nav {\n  color: #333;\n}\n.nav a {\n  padding: 4px 4px;\n}\n.nav a:hover {\n  color: red;\n}\n"
        );
    }

    #[test]
    fn selector_lists_multiply() {
        let src = ".a, .b { .c, &-d { x: 1 } }";
        assert_eq!(compile(src).unwrap(), ".a .c,\n.a-d,\n.b .c,\n.b-d {\n  x: 1;\n}\n");
    }

    #[test]
    fn variables_are_lazy_and_scoped() {
        let src = "@x: 1;\n.a { @x: 2; w: @x; }\n.b { w: @x; }\n@y: @z;\n@z: 3px;\n.c { m: @y; }\n@x: 5;";
        assert_eq!(
            compile(src).unwrap(),
            ".a {\n  w: 2;\n}\n.b {\n  w: 5;\n}\n.c {\n  m: 3px;\n}\n"
        );
    }

    #[test]
    fn interpolation() {
        let src = "@name: banner;\n@prop: color;\n@q: \"x\";\n.@{name} { @{prop}: red; background-@{prop}: blue; content: \"@{name}\"; quote: @{q}; }";
        assert_eq!(
            compile(src).unwrap(),
            ".banner {\n  color: red;\n  background-color: blue;\n  content: \"banner\";\n  quote: x;\n}\n"
        );
    }

    #[test]
    fn escaped_strings() {
        let src = "@gap: 10px;\n.a { width: ~\"calc(100% - @{gap})\"; }";
        assert_eq!(compile(src).unwrap(), ".a {\n  width: calc(100% - 10px);\n}\n");
    }

    #[test]
    fn media_bubbles_out_of_rules() {
        let src = ".a { color: red; @media (max-width: 600px) { color: blue; .b { x: 1 } } }";
        assert_eq!(
            compile(src).unwrap(),
            ".a {\n  color: red;\n}\n@media (max-width: 600px) {\n  .a {\n    color: blue;\n  }\n  .a .b {\n    x: 1;\n  }\n}\n"
        );
    }

    #[test]
    fn nested_media_queries_combine() {
        let src = "@media screen { .a { @media (min-width: 10px) { x: 1 } } }";
        assert_eq!(
            compile(src).unwrap(),
            "@media screen and (min-width: 10px) {\n  .a {\n    x: 1;\n  }\n}\n"
        );
    }

    #[test]
    fn media_query_variable() {
        let src = "@phone: ~\"(max-width: 480px)\";\n@media @phone { .a { x: 1 } }";
        assert_eq!(
            compile(src).unwrap(),
            "@media (max-width: 480px) {\n  .a {\n    x: 1;\n  }\n}\n"
        );
    }

    #[test]
    fn other_at_rules_pass_through() {
        let src = "@font-face { font-family: \"X\"; src: url(f.woff); }\n@keyframes spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } }";
        assert_eq!(
            compile(src).unwrap(),
            "@font-face {\n  font-family: \"X\";\n  src: url(f.woff);\n}\n@keyframes spin {\n  from {\n    transform: rotate(0deg);\n  }\n  to {\n    transform: rotate(360deg);\n  }\n}\n"
        );
    }

    #[test]
    fn mixins() {
        let src = ".rounded { border-radius: 4px; }\n.hidden() { display: none; }\n.box { .rounded; .hidden(); color: red; }\n.imp { .rounded !important; }";
        assert_eq!(
            compile(src).unwrap(),
            ".rounded {\n  border-radius: 4px;\n}\n.box {\n  border-radius: 4px;\n  display: none;\n  color: red;\n}\n.imp {\n  border-radius: 4px !important;\n}\n"
        );
    }

    #[test]
    fn comments_are_dropped() {
        let src = "// line\n/* block */\n.a { /* c */ color: red; // trailing\n background: url(http://x.com/a.png); }";
        assert_eq!(
            compile(src).unwrap(),
            ".a {\n  color: red;\n  background: url(http://x.com/a.png);\n}\n"
        );
    }

    #[test]
    fn charset_hoisted() {
        let src = ".a { x: 1 }\n@charset \"utf-8\";";
        assert_eq!(compile(src).unwrap(), "@charset \"utf-8\";\n.a {\n  x: 1;\n}\n");
    }

    #[test]
    fn operations_on_variables() {
        let src = "@w: 10px;\n@gutter: @w * 2;\n@base: #111;\n.a { width: @w * 2; margin: 0 -@w; padding: (@gutter / 4) @w + 1; color: @base * 3; font: 12px/1.5 serif; }";
        assert_eq!(
            compile(src).unwrap(),
            ".a {\n  width: 20px;\n  margin: 0 -10px;\n  padding: 5px 11px;\n  color: #333333;\n  font: 12px/1.5 serif;\n}\n"
        );
    }

    #[test]
    fn multi_part_variables_stay_literal() {
        let src = "@border: 1px solid #ccc;\n@phone: ~\"screen and (max-width: 480px)\";\n.a { border: @border; }\n@media @phone { .a { x: 1 + 1 } }";
        assert_eq!(
            compile(src).unwrap(),
            ".a {\n  border: 1px solid #ccc;\n}\n@media screen and (max-width: 480px) {\n  .a {\n    x: 2;\n  }\n}\n"
        );
        let err = compile("@b: 1px solid;\n.a { width: @b * 2; }").unwrap_err();
        assert!(err.to_string().contains("cannot apply '*'"), "{err}");
    }

    #[test]
    fn unsupported_less_is_an_error() {
        let cases = [
            ("@c: #333;\n.a { color: darken(@c, 10%); }", "function darken() is not supported"),
            (".a when (iscolor(red)) { x: 1 }", "guards (`when`) are not supported"),
            (".a { &:extend(.b); }", "`:extend` is not supported"),
            (".b:extend(.a) { x: 1 }", "`:extend` is not supported"),
            (".m(@x) { w: @x }", "parametric mixins are not supported"),
            (".a { width: 10px + 2em; }", "incompatible units px and em in '+'"),
        ];
        for (src, message) in cases {
            let err = compile(src).unwrap_err();
            assert!(matches!(err, LessError::Syntax { .. }), "{src}: {err:?}");
            assert!(err.to_string().ends_with(message), "{src}: {err}");
        }
    }

    #[test]
    fn undefined_variable_has_location() {
        let err = compile(".a {\n  color: @nope;\n}").unwrap_err();
        assert!(matches!(&err, LessError::UndefinedVariable { name, .. } if name == "nope"));
        assert_eq!(err.to_string(), "main.less:2:3: variable @nope is undefined");
        assert!(err.to_diagnostic().is_some());
    }

    #[test]
    fn undefined_and_recursive_mixins() {
        let err = compile(".a { .missing; }").unwrap_err();
        assert!(matches!(err, LessError::UndefinedMixin { ref name, .. } if name == ".missing"));

        let err = compile(".loop { .loop; }").unwrap_err();
        assert!(err.to_string().contains("mixin .loop calls itself"));
    }

    #[test]
    fn recursive_variable_is_an_error() {
        let err = compile("@a: @b;\n@b: @a;\n.x { y: @a; }").unwrap_err();
        assert!(err.to_string().contains("recursive variable definition"));
    }

    #[test]
    fn declarations_at_top_level_rejected() {
        let err = compile("color: red;").unwrap_err();
        assert!(err.to_string().contains("declarations must be inside a ruleset"));
    }

    #[test]
    fn syntax_errors_carry_line() {
        let err = compile(".a {\n  color: red;\n").unwrap_err();
        assert_eq!(err.to_string(), "main.less:1:4: unterminated block");
    }

    #[test]
    fn imports_inline_with_relative_urls() {
        let dir = TempDir::new().unwrap();
        write(&dir, "styles/vars.less", "@brand: red;\n");
        write(
            &dir,
            "styles/buttons.less",
            ".btn { background: url(../img/b.png); }\n.icon { background: url(\"icons/i.svg#a\"); }\n@import \"vars\";\n",
        );
        let entry = write(
            &dir,
            "main.less",
            "@import \"styles/vars\";\n@import \"styles/buttons.less\";\n@import \"reset.css\";\n.x { c: @brand; }\n",
        );
        let mut db = SourceDb::new();
        let css = compile_file(&mut db, &entry).unwrap();
        assert_eq!(
            css,
            "@import \"reset.css\";\n.btn {\n  background: url(img/b.png);\n}\n.icon {\n  background: url(\"styles/icons/i.svg#a\");\n}\n.x {\n  c: red;\n}\n"
        );
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn missing_import() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "main.less", "\n@import \"nope\";\n");
        let mut db = SourceDb::new();
        let err = compile_file(&mut db, &entry).unwrap_err();
        assert!(matches!(&err, LessError::MissingImport { path, .. } if path == "nope"));
        assert!(err.to_string().contains(":2:1: cannot find imported file 'nope'"));
    }

    #[test]
    fn import_cycle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.less", "@import \"b\";\n");
        write(&dir, "b.less", "@import \"a\";\n");
        let entry = write(&dir, "main.less", "@import \"a\";\n");
        let mut db = SourceDb::new();
        let err = compile_file(&mut db, &entry).unwrap_err();
        assert!(matches!(err, LessError::ImportCycle { .. }));
    }

    #[test]
    fn missing_entry_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut db = SourceDb::new();
        let err = compile_file(&mut db, &dir.path().join("main.less")).unwrap_err();
        assert!(matches!(err, LessError::Io { .. }));
    }

    #[test]
    fn relative_joins() {
        assert_eq!(join_relative("styles", "../img/a.png"), "img/a.png");
        assert_eq!(join_relative("", "../shared/a.png"), "../shared/a.png");
        assert_eq!(join_relative("a/b", "./c/../d.png"), "a/b/d.png");
    }
}
