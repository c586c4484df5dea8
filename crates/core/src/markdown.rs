//! Markdown to HTML for the HTML box.
//!
//! Formulas are turned into code before conversion: display math becomes a
//! fenced block and inline math an inline code span, so that emphasis
//! markers inside a formula are not interpreted.

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static DISPLAY_MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$\$(.+?)\$\$").expect("BUG: invalid DISPLAY_MATH_RE regex literal")
});

static INLINE_MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$(.+?)\$").expect("BUG: invalid INLINE_MATH_RE regex literal")
});

/// Rewrites `$$..$$` as a fenced code block and `$..$` as inline code.
pub fn protect_math(text: &str) -> Cow<'_, str> {
    if !text.contains('$') {
        return Cow::Borrowed(text);
    }
    let display = DISPLAY_MATH_RE.replace_all(text, "\n```\n$1\n```\n");
    let inline = INLINE_MATH_RE.replace_all(&display, "`$1`");
    Cow::Owned(inline.into_owned())
}

pub fn markdown_to_html(text: &str) -> String {
    let source = protect_math(text);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(&source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Byte offset in the markdown `source` just past the last character of
/// `drawn`, the visible text an HTML box drew from it.
///
/// Each visible character of `drawn` is matched to its earliest occurrence
/// in `source` after the previous match; markup and whitespace between them
/// are skipped. A character with no match is ignored. The earliest match
/// never lies past the real one, so the offset errs towards text that was
/// drawn, never towards text that was not.
pub fn source_offset_after(source: &str, drawn: &str) -> usize {
    let mut offset = 0;
    for ch in drawn.chars().filter(|c| !c.is_whitespace()) {
        if let Some(at) = source[offset..].find(ch) {
            offset += at + ch.len_utf8();
        }
    }
    offset
}
