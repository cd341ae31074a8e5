/// Neutralize markup-significant characters.
///
/// The output is safe as element text and inside single- or double-quoted
/// attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Absent input escapes to the empty string.
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape_html).unwrap_or_default()
}
