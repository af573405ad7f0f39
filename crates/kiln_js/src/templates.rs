//! Compiling HTML templates into a `$templateCache` preload script.

/// An HTML template and the path it is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Logical path, used as the cache key (`views/home.html`).
    pub path: String,
    /// Raw template markup.
    pub html: String,
}

impl Template {
    /// Creates a template.
    pub fn new(path: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            html: html.into(),
        }
    }
}

/// Emits a script registering every template in `module`'s template cache.
///
/// Templates are registered in the order given. Paths and markup are written
/// as JSON string literals, which are valid JavaScript.
pub fn compile_templates(module: &str, templates: &[Template]) -> String {
    let mut out = format!(
        "angular.module({}).run([\"$templateCache\",function($templateCache){{",
        js_string(module)
    );
    for t in templates {
        out.push_str("$templateCache.put(");
        out.push_str(&js_string(&t.path));
        out.push(',');
        out.push_str(&js_string(&t.html));
        out.push_str(");");
    }
    out.push_str("}]);");
    out
}

fn js_string(s: &str) -> String {
    let mut quoted = serde_json::Value::String(s.to_string()).to_string();
    // JSON allows raw U+2028/U+2029, older JavaScript string literals do not.
    if quoted.contains(['\u{2028}', '\u{2029}']) {
        quoted = quoted.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");
    }
    quoted
}
