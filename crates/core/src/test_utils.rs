//! In-memory documents for driving the composer in tests.

use marginalia_traits::{
    DestinationDocument, DocumentError, FontSource, HtmlBoxFit, SourceDocument, TextBlock,
    TextBoxFit, TextStyle,
};
use marginalia_types::{PageGeometry, PageHandle, Rect};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic text of numbered words, so no two slices are equal.
pub fn numbered_words(chars: usize) -> String {
    let mut text = String::with_capacity(chars + 16);
    let mut i = 0;
    while text.len() < chars {
        text.push_str(&format!("word{i} "));
        i += 1;
    }
    text.truncate(chars);
    text
}

#[derive(Debug, Default)]
pub struct FakeSource {
    pub pages: Vec<PageGeometry>,
    pub rotation_calls: Vec<(usize, i32)>,
}

impl FakeSource {
    pub fn new(count: usize, width: f32, height: f32) -> Self {
        Self {
            pages: vec![PageGeometry::new(width, height); count],
            rotation_calls: Vec::new(),
        }
    }

    pub fn letter(count: usize) -> Self {
        Self::new(count, 612.0, 792.0)
    }

    pub fn rotated(mut self, index: usize, degrees: i32) -> Self {
        self.pages[index].rotation = degrees;
        self
    }
}

impl SourceDocument for FakeSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry, DocumentError> {
        self.pages.get(index).copied().ok_or(DocumentError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }

    fn set_rotation(&mut self, index: usize, degrees: i32) -> Result<(), DocumentError> {
        let count = self.pages.len();
        let page = self
            .pages
            .get_mut(index)
            .ok_or(DocumentError::PageOutOfRange { index, count })?;
        page.rotation = degrees;
        self.rotation_calls.push((index, degrees));
        Ok(())
    }
}

/// How the fake text box reports what did not fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverflowPolicy {
    /// Reports the byte offset where the fixed-advance grid ran out.
    Exact,
    /// Reports only the width of the chars past capacity.
    WidthOnly,
    /// Claims, by width, that 99% of every fragment did not fit.
    NinetyNinePercent,
}

/// Error the fake HTML box fails with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HtmlFailure {
    Markup,
    Font,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub width: f32,
    pub height: f32,
    /// Target rect, source page index and the source rotation at copy time.
    pub shown: Vec<(Rect, usize, i32)>,
    pub text_boxes: Vec<(Rect, String)>,
    pub html_boxes: Vec<(Rect, String)>,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug)]
pub struct FakeDestination {
    pub pages: Vec<FakePage>,
    pub policy: OverflowPolicy,
    pub html_failure: Option<HtmlFailure>,
    /// Report what the HTML box drew instead of leaving it to geometry.
    pub html_reports_fit: bool,
    pub fail_show: bool,
    pub fail_text_blocks: bool,
    /// Body size and line height the fake HTML box lays out with.
    pub html_font_size: f32,
    pub html_line_height: f32,
}

impl Default for FakeDestination {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            policy: OverflowPolicy::Exact,
            html_failure: None,
            html_reports_fit: false,
            fail_show: false,
            fail_text_blocks: false,
            html_font_size: 12.0,
            html_line_height: 12.0 * 1.4,
        }
    }
}

/// Advance of every char, as a share of the font size.
pub const FAKE_ADVANCE: f32 = 0.375;

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: OverflowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_page() -> Self {
        let mut dst = Self::default();
        dst.pages.push(FakePage {
            width: 1836.0,
            height: 792.0,
            ..FakePage::default()
        });
        dst
    }

    pub fn push_block(&mut self, page: PageHandle, bbox: Rect, text: &str) {
        self.pages[page.index()].blocks.push(TextBlock {
            bbox,
            text: text.to_string(),
        });
    }

    pub fn page(&self, index: usize) -> &FakePage {
        &self.pages[index]
    }

    fn page_mut(&mut self, page: PageHandle) -> Result<&mut FakePage, DocumentError> {
        self.pages
            .get_mut(page.index())
            .ok_or(DocumentError::UnknownPage(page))
    }
}

/// Chars per line and lines for a rect, with the fake's fixed metrics.
fn grid(rect: &Rect, font_size: f32, line_height: f32) -> (usize, usize) {
    let per_line = ((rect.width() / (font_size * FAKE_ADVANCE)).floor() as usize).max(1);
    let lines = (rect.height() / line_height).floor().max(0.0) as usize;
    (per_line, lines)
}

impl DestinationDocument<FakeSource> for FakeDestination {
    fn new_page(&mut self, width: f32, height: f32) -> Result<PageHandle, DocumentError> {
        self.pages.push(FakePage {
            width,
            height,
            ..FakePage::default()
        });
        Ok(PageHandle::new(self.pages.len() - 1))
    }

    fn show_source_page(
        &mut self,
        page: PageHandle,
        rect: Rect,
        source: &FakeSource,
        index: usize,
    ) -> Result<(), DocumentError> {
        if self.fail_show {
            return Err(DocumentError::Pdf("copy failed".to_string()));
        }
        let rotation = source.page_geometry(index)?.rotation;
        self.page_mut(page)?.shown.push((rect, index, rotation));
        Ok(())
    }

    fn insert_text_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextBoxFit, DocumentError> {
        let line_height = style.font_size * style.line_spacing.max(1.0);
        let (per_line, lines) = grid(&rect, style.font_size, line_height);
        let len = text.chars().count();
        let fit = len.min(per_line * lines);
        let used_lines = fit.div_ceil(per_line);
        let drawn: String = text.chars().take(fit).collect();
        let stopped_at = drawn.len();
        let policy = self.policy;
        let target = self.page_mut(page)?;
        target.text_boxes.push((rect, drawn.clone()));
        if used_lines > 0 {
            target.blocks.push(TextBlock {
                bbox: Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + used_lines as f32 * line_height),
                text: drawn,
            });
        }
        let advance = style.font_size * FAKE_ADVANCE;
        let overflow_width = (len - fit) as f32 * advance;
        Ok(match policy {
            OverflowPolicy::Exact if text[stopped_at..].trim().is_empty() => TextBoxFit::AllDrawn,
            OverflowPolicy::Exact => TextBoxFit::StoppedAt {
                offset: stopped_at,
                overflow_width,
            },
            OverflowPolicy::WidthOnly => TextBoxFit::WidthOnly(overflow_width),
            OverflowPolicy::NinetyNinePercent => TextBoxFit::WidthOnly(len as f32 * advance * 0.99),
        })
    }

    fn insert_html_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        html: &str,
        _css: &str,
        _font: &FontSource,
    ) -> Result<HtmlBoxFit, DocumentError> {
        match self.html_failure {
            Some(HtmlFailure::Markup) => return Err(DocumentError::Markup("unsupported markup".to_string())),
            Some(HtmlFailure::Font) => return Err(DocumentError::Font("font registration failed".to_string())),
            None => {}
        }
        let (font_size, line_height) = (self.html_font_size, self.html_line_height);
        let (per_line, rows) = grid(&rect, font_size, line_height);
        let visible = strip_tags(html);
        let lines = visible.chars().count().div_ceil(per_line);
        let report = self.html_reports_fit;
        let target = self.page_mut(page)?;
        target.html_boxes.push((rect, html.to_string()));
        let fit = if !report {
            HtmlBoxFit::Unreported
        } else if lines <= rows {
            HtmlBoxFit::AllDrawn
        } else {
            HtmlBoxFit::Clipped {
                drawn_text: visible.chars().take(per_line * rows).collect(),
            }
        };
        if lines > 0 {
            // Unclipped, like a real layout engine reports it.
            target.blocks.push(TextBlock {
                bbox: Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + lines as f32 * line_height),
                text: visible,
            });
        }
        Ok(fit)
    }

    fn text_blocks(&self, page: PageHandle) -> Result<Vec<TextBlock>, DocumentError> {
        if self.fail_text_blocks {
            return Err(DocumentError::Pdf("no text layer".to_string()));
        }
        self.pages
            .get(page.index())
            .map(|p| p.blocks.clone())
            .ok_or(DocumentError::UnknownPage(page))
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(self) -> Result<Vec<u8>, DocumentError> {
        Ok(format!("{} pages", self.pages.len()).into_bytes())
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '\n' => {}
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
