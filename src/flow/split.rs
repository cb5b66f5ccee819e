/// How far back from the fit limit a sentence or word boundary is searched.
pub const LOOKBACK: usize = 100;

/// Pick the cut point (in chars) for text that fits up to `limit` chars.
///
/// Within the `LOOKBACK` window before the limit the last period wins, then
/// the last whitespace; with neither the raw limit is used. The returned index
/// is just past the boundary character, so the period or space stays on the
/// first fragment. Never returns 0 for a positive limit.
pub fn find_split_index(text: &str, limit: usize) -> usize {
    let len = text.chars().count();
    if limit >= len {
        return len;
    }
    let start = limit.saturating_sub(LOOKBACK);
    let window: Vec<char> = text.chars().skip(start).take(limit - start).collect();

    if let Some(pos) = window.iter().rposition(|&c| c == '.') {
        return start + pos + 1;
    }
    if let Some(pos) = window.iter().rposition(|c| c.is_whitespace()) {
        return start + pos + 1;
    }
    limit
}

/// Split `text` after `n` chars. Prefix and remainder concatenate to the input.
pub fn split_at_char(text: &str, n: usize) -> (&str, &str) {
    let byte = text
        .char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.split_at(byte)
}
