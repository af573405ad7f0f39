//! Joining minified fragments into one bundle.

/// Concatenates script fragments with a `;` between each pair.
///
/// Minified fragments may end without a semicolon, or start with `(` or `[`,
/// so a bare join could merge the last statement of one file with the first
/// of the next. Empty fragments are skipped.
pub fn concat_scripts<S: AsRef<str>>(fragments: &[S]) -> String {
    let mut out = String::new();
    for fragment in fragments.iter().map(AsRef::as_ref).filter(|f| !f.is_empty()) {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(fragment);
    }
    out
}
