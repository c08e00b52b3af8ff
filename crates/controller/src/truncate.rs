//! Character-safe truncation of tool results.

use std::borrow::Cow;

/// Appended to text cut at the cap.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Cut `text` to at most `cap` characters, then append [`TRUNCATION_MARKER`].
///
/// Never splits a UTF-8 sequence. Text at or under the cap is returned as-is,
/// and so is text that is already exactly `cap` characters plus the marker,
/// so applying this twice is the same as applying it once.
pub fn truncate_chars(text: &str, cap: usize) -> Cow<'_, str> {
    let Some((cut, _)) = text.char_indices().nth(cap) else {
        return Cow::Borrowed(text);
    };

    if let Some(body) = text.strip_suffix(TRUNCATION_MARKER) {
        if body.chars().count() == cap {
            return Cow::Borrowed(text);
        }
    }

    let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
    truncated.push_str(&text[..cut]);
    truncated.push_str(TRUNCATION_MARKER);
    Cow::Owned(truncated)
}
