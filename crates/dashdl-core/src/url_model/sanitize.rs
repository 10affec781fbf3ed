//! Filename sanitization for manifest titles.

/// Makes a manifest title safe to use as a filename stem.
///
/// - Replaces `/`, `\` and `:` with `-`
/// - Removes `*`, `?`, `"`, `<`, `>` and `|`
/// - Trims surrounding whitespace
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '/' | '\\' | ':' => out.push('-'),
            '*' | '?' | '"' | '<' | '>' | '|' => {}
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}
