//! Reading the entry HTML: vendor `<script>` and stylesheet `<link>` tags,
//! and rewriting asset references with the manifest.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::rev::RevManifest;
use kiln_common::path::join_dir;
use kiln_common::LogicalPath;
use kiln_less::{is_rebasable, strip_query_and_fragment};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>").expect("static script regex is valid")
});

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").expect("static link regex is valid"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("static attribute regex is valid")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static comment regex is valid"));

fn attribute<'h>(attrs: &'h str, name: &str) -> Option<&'h str> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim())
    })
}

/// The `src` of every `<script>` tag, in document order.
///
/// Tags inside HTML comments are ignored.
pub fn script_sources(html: &str) -> Vec<String> {
    let html = COMMENT_RE.replace_all(html, "");
    SCRIPT_RE
        .captures_iter(&html)
        .filter_map(|caps| attribute(&caps[1], "src").map(str::to_string))
        .filter(|src| !src.is_empty())
        .collect()
}

/// The `href` of every `<link rel="stylesheet">` tag, in document order.
///
/// Tags inside HTML comments are ignored.
pub fn stylesheet_hrefs(html: &str) -> Vec<String> {
    let html = COMMENT_RE.replace_all(html, "");
    LINK_RE
        .captures_iter(&html)
        .filter(|caps| {
            attribute(&caps[1], "rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            })
        })
        .filter_map(|caps| attribute(&caps[1], "href").map(str::to_string))
        .filter(|href| !href.is_empty())
        .collect()
}

/// Loads the local files an HTML page references.
///
/// References are resolved against the page's directory; root-relative ones
/// (`/lib/x.js`) against the source root. Absolute URLs are skipped, as are
/// references to paths in `outputs`, which name files the build itself
/// produces. Each file is loaded once.
pub fn load_references(
    root: &Path,
    html: &LogicalPath,
    references: &[String],
    outputs: &[&LogicalPath],
) -> Result<Vec<Asset>, PipelineError> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for reference in references {
        let Some(path) = resolve_reference(html, reference) else {
            debug!(target: "kiln::script", %reference, "skipping external reference");
            continue;
        };
        if outputs.contains(&&path) || !seen.insert(path.clone()) {
            continue;
        }
        if !path.to_fs_path(root).is_file() {
            return Err(PipelineError::MissingReference {
                html: html.clone(),
                reference: reference.clone(),
            });
        }
        assets.push(Asset::read(root, path)?);
    }
    Ok(assets)
}

/// Resolves a `src`/`href` value to a logical path, or `None` for external
/// URLs and values that leave the source root.
fn resolve_reference(html: &LogicalPath, reference: &str) -> Option<LogicalPath> {
    let path = strip_query_and_fragment(reference);
    if let Some(rooted) = path.strip_prefix('/') {
        if rooted.starts_with('/') {
            return None;
        }
        return LogicalPath::new(rooted).ok();
    }
    if !is_rebasable(path) {
        return None;
    }
    join_dir(html.dir(), path).ok()
}

/// Replaces every reference to a manifest key in `html` with its value.
///
/// Keys are matched on path boundaries only: `app.js` matches in
/// `src="app.js"`, `src="/app.js"` and `src="./app.js"` but not inside
/// `myapp.js` or `lib/app.js`. At one position the longest key wins, and
/// replaced text is not scanned again.
pub fn rewrite_references(html: &str, manifest: &RevManifest) -> String {
    if manifest.is_empty() {
        return html.to_string();
    }
    let mut keys: Vec<&str> = manifest.iter().map(|(k, _)| k).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(re) = Regex::new(&alternation) else {
        return html.to_string();
    };

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut pos = 0;
    while let Some(m) = re.find_at(html, pos) {
        if boundary_before(html, m.start()) && boundary_after(html, m.end()) {
            if let Some(value) = manifest.get(m.as_str()) {
                out.push_str(&html[last..m.start()]);
                out.push_str(value);
                last = m.end();
            }
            pos = m.end();
        } else {
            pos = m.start() + html[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        if pos >= html.len() {
            break;
        }
    }
    out.push_str(&html[last..]);
    out
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b'\\' | b'@' | b'~')
}

fn boundary_before(text: &str, start: usize) -> bool {
    let bytes = &text.as_bytes()[..start];
    let mut i = bytes.len();
    // a leading `/` or `./` still refers to the root
    if i > 0 && bytes[i - 1] == b'/' {
        i -= 1;
        if i > 0 && bytes[i - 1] == b'.' {
            i -= 1;
        }
    }
    i == 0 || !is_path_byte(bytes[i - 1])
}

fn boundary_after(text: &str, end: usize) -> bool {
    text.as_bytes().get(end).map_or(true, |&b| !is_path_byte(b))
}
