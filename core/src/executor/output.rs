pub const TRUNCATION_MARKER: &str = "[... TRUNCATED ...]\n";

/// Keeps the last `max_chars` characters of `text`, prefixed with
/// [`TRUNCATION_MARKER`] when anything was dropped.
pub fn truncate_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let skip = count - max_chars;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{TRUNCATION_MARKER}{}", &text[start..])
}
