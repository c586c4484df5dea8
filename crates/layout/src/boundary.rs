//! Character-index helpers and natural break-point search.
//!
//! All positions exchanged with callers are character indices; conversion to
//! byte offsets happens here so slicing never lands inside a UTF-8 sequence.

/// Separators tried when splitting a text across columns, in priority order.
pub const SPLIT_SEPARATORS: &[&str] = &[
    "。", "！", "？", "；", "：", "，", ".", "!", "?", ";", ":", ",", "\n\n", "\n", " ",
];

/// Characters a cut derived from an overflow report may snap to.
pub const OVERFLOW_BOUNDARIES: &[char] = &[' ', '\n', '，', '。', '！', '？'];

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `char_index`, or `text.len()` past the end.
pub fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Splits `text` after `char_index` characters.
pub fn split_at_char(text: &str, char_index: usize) -> (&str, &str) {
    text.split_at(byte_offset(text, char_index))
}

/// Finds where to end a window of text so that it breaks at a natural
/// boundary.
///
/// Separators are tried in [`SPLIT_SEPARATORS`] order; the first one whose
/// last occurrence starts past `min_ratio` of the window wins, and the
/// returned byte offset lies just after it.
pub fn find_split_point(window: &str, min_ratio: f32) -> Option<usize> {
    let window_chars = char_len(window);
    if window_chars == 0 {
        return None;
    }
    let floor = window_chars as f32 * min_ratio;
    SPLIT_SEPARATORS.iter().find_map(|separator| {
        let position = window.rfind(separator)?;
        let position_chars = char_len(&window[..position]);
        (position_chars as f32 > floor).then_some(position + separator.len())
    })
}

/// Searches forward from `from` (a character index) for the first overflow
/// boundary within `window` characters and returns the index just after it.
pub fn find_forward_boundary(text: &str, from: usize, window: usize) -> Option<usize> {
    text.chars()
        .enumerate()
        .skip(from)
        .take(window)
        .find(|(_, c)| OVERFLOW_BOUNDARIES.contains(c))
        .map(|(index, _)| index + 1)
}
