pub mod timestamps;

/// Trimmed text, or `None` when the input is absent or whitespace-only.
///
/// Empty filters and blank optional fields are treated as "not provided" everywhere; they are
/// never matched or stored as the empty string.
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Escape `LIKE` metacharacters so the term matches literally (escape char is `\`).
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
