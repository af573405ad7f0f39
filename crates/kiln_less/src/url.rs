//! `url()` references in stylesheets.
//!
//! Helpers to find, strip, rebase and replace the targets of CSS `url(...)`
//! values. They operate on plain text and do not need a parsed stylesheet.

use kiln_common::path::join_dir;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#)
        .expect("url() pattern is valid")
});

fn target<'a>(caps: &Captures<'a>) -> (&'a str, &'static str) {
    if let Some(m) = caps.get(1) {
        (m.as_str(), "\"")
    } else if let Some(m) = caps.get(2) {
        (m.as_str(), "'")
    } else {
        (caps.get(3).map_or("", |m| m.as_str()), "")
    }
}

/// Returns the target of every `url(...)` in `css`, unquoted, in order.
pub fn extract_urls(css: &str) -> Vec<String> {
    URL_RE
        .captures_iter(css)
        .map(|caps| target(&caps).0.to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// Replaces each `url(...)` target for which `f` returns `Some`.
///
/// The original quote character is kept. Targets for which `f` returns `None`
/// are left byte-for-byte untouched.
pub fn rewrite_urls<F>(css: &str, mut f: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    URL_RE
        .replace_all(css, |caps: &Captures| {
            let (url, quote) = target(caps);
            match f(url) {
                Some(new) => format!("url({quote}{new}{quote})"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Splits `url` into the path and its `?query` / `#fragment` suffix.
pub fn split_query_and_fragment(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// Drops any `?query` or `#fragment` from `url`.
pub fn strip_query_and_fragment(url: &str) -> &str {
    split_query_and_fragment(url).0
}

/// Returns `true` for a relative reference to a file.
///
/// `data:` URIs, absolute URLs (`https:`, `//cdn`), root-relative paths and
/// fragment-only references (SVG filters) are not rebasable.
pub fn is_rebasable(url: &str) -> bool {
    if url.is_empty() || url.starts_with(['/', '#', '?']) {
        return false;
    }
    !has_scheme(url)
}

fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Rewrites the relative URLs of a stylesheet located in `from_dir` so they
/// resolve from the source root.
///
/// `from_dir` is a logical directory (`""` for the root). References that
/// would climb above the root are left as they are.
pub fn rebase_urls(css: &str, from_dir: &str) -> String {
    if from_dir.is_empty() {
        return css.to_string();
    }
    rewrite_urls(css, |url| rebase_one(url, from_dir))
}

pub(crate) fn rebase_one(url: &str, from_dir: &str) -> Option<String> {
    if !is_rebasable(url) {
        return None;
    }
    let (path, suffix) = split_query_and_fragment(url);
    let rebased = join_dir(from_dir, path).ok()?;
    Some(format!("{rebased}{suffix}"))
}
