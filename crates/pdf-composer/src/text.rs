//! Greedy line breaking over byte spans of the input.

/// One wrapped line, as a byte range into the wrapped text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineSpan {
    pub start: usize,
    pub end: usize,
    pub width: f32,
}

impl LineSpan {
    pub(crate) fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Breaks `text` into lines no wider than `max_width`.
///
/// Hard newlines always break. Words wider than a line are broken between
/// characters. Whitespace at a soft break is dropped; an empty paragraph
/// yields an empty line.
pub(crate) fn wrap_text<F>(text: &str, max_width: f32, mut measure: F) -> Vec<LineSpan>
where
    F: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut offset = 0;
    for paragraph in text.split('\n') {
        wrap_paragraph(text, offset, offset + paragraph.len(), max_width, &mut measure, &mut lines);
        offset += paragraph.len() + 1;
    }
    lines
}

fn wrap_paragraph<F>(
    text: &str,
    start: usize,
    end: usize,
    max_width: f32,
    measure: &mut F,
    lines: &mut Vec<LineSpan>,
) where
    F: FnMut(&str) -> f32,
{
    let before = lines.len();
    let mut current: Option<LineSpan> = None;

    for (word_start, word_end) in words(text, start, end) {
        if let Some(line) = current {
            let width = measure(&text[line.start..word_end]);
            if width <= max_width {
                current = Some(LineSpan {
                    end: word_end,
                    width,
                    ..line
                });
                continue;
            }
            lines.push(line);
        }

        let width = measure(&text[word_start..word_end]);
        current = if width <= max_width {
            Some(LineSpan {
                start: word_start,
                end: word_end,
                width,
            })
        } else {
            break_word(text, word_start, word_end, max_width, measure, lines)
        };
    }

    lines.extend(current);
    if lines.len() == before {
        lines.push(LineSpan {
            start,
            end: start,
            width: 0.0,
        });
    }
}

/// Byte ranges of the space-separated words in `text[start..end]`.
fn words(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut words = Vec::new();
    let mut word_start = None;
    for (i, ch) in text[start..end].char_indices() {
        let at = start + i;
        match (ch.is_whitespace(), word_start) {
            (true, Some(ws)) => {
                words.push((ws, at));
                word_start = None;
            }
            (false, None) => word_start = Some(at),
            _ => {}
        }
    }
    if let Some(ws) = word_start {
        words.push((ws, end));
    }
    words
}

/// Pushes full-width pieces of an oversized word and returns the remainder.
fn break_word<F>(
    text: &str,
    start: usize,
    end: usize,
    max_width: f32,
    measure: &mut F,
    lines: &mut Vec<LineSpan>,
) -> Option<LineSpan>
where
    F: FnMut(&str) -> f32,
{
    let mut piece = LineSpan {
        start,
        end: start,
        width: 0.0,
    };
    for (i, ch) in text[start..end].char_indices() {
        let next = start + i + ch.len_utf8();
        let width = measure(&text[piece.start..next]);
        // A piece always takes at least one char, however narrow the line.
        if width > max_width && piece.end > piece.start {
            lines.push(piece);
            piece = LineSpan {
                start: start + i,
                end: next,
                width: measure(&text[start + i..next]),
            };
        } else {
            piece.end = next;
            piece.width = width;
        }
    }
    (piece.end > piece.start).then_some(piece)
}
