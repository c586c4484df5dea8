//! One source page: copy it to the left of a wider page, then flow the
//! explanation through the columns on the right.

use crate::continuation::ContinuationEngine;
use crate::error::{ComposeError, PageContext};
use crate::overflow::OverflowDetector;
use crate::render::{FragmentRenderer, MarkdownRenderer, RenderContext, RenderOutcome, TextRenderer};
use crate::report::PageReport;
use marginalia_layout::boundary::{char_len, split_at_char};
use marginalia_layout::{ColumnPlan, ColumnPlanner, ColumnRequest, TextSplitter, effective_length};
use marginalia_traits::{DestinationDocument, DocumentError, SourceDocument};
use marginalia_types::{PageGeometry, PageHandle, Rect, RenderMode, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    Pending,
    RenderedNoOverflow,
    RenderedOverflow,
}

/// Text a column could not hold, and the column it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowRecord {
    pub column: usize,
    pub rect: Rect,
    pub text: String,
}

/// Result of flowing text through one page's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsOutcome {
    pub states: Vec<ColumnState>,
    /// Overflow of the last column. Earlier columns pass theirs forward.
    pub leftover: Option<OverflowRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageRenderer<'c> {
    ctx: &'c RenderContext,
}

impl<'c> PageRenderer<'c> {
    pub fn new(ctx: &'c RenderContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &'c RenderContext {
        self.ctx
    }

    /// Renders source page `page_index` with `explanation` beside it, plus
    /// any continuation pages the text needs.
    pub fn render_page<S, D>(
        &self,
        dst: &mut D,
        src: &mut S,
        page_index: usize,
        explanation: Option<&str>,
    ) -> Result<PageReport, ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let mut report = PageReport::new(page_index);
        let geometry = src.page_geometry(page_index).on_page(page_index)?;
        let page = self.copy_source_page(dst, src, page_index, geometry)?;

        let text = match explanation {
            Some(text) if self.ctx.mode.draws_explanation() && !text.trim().is_empty() => text,
            _ => return Ok(report),
        };

        let plan = self.plan(geometry, text, 0.0);
        report.columns = plan.rects.len();
        let fragments = TextSplitter::new(&self.ctx.tuning).split(text, &plan.rects, &self.ctx.flow_style());
        let outcome = self.render_columns::<S, D>(dst, page, page_index, &plan.rects, fragments, &mut report)?;

        if let Some(leftover) = outcome.leftover {
            ContinuationEngine::new(self).run(dst, src, page_index, geometry, leftover, &mut report)?;
        }
        Ok(report)
    }

    pub(crate) fn plan(&self, geometry: PageGeometry, text: &str, top_offset: f32) -> ColumnPlan {
        let request = ColumnRequest {
            page: geometry.size(),
            style: self.ctx.flow_style(),
            text_len: effective_length(text),
            column_padding: self.ctx.column_padding,
            top_offset,
        };
        ColumnPlanner::new(&self.ctx.tuning).plan(&request)
    }

    /// Adds a widened page and draws the source page unscaled on its left.
    ///
    /// A rotated source page is drawn upright: its rotation is cleared for
    /// the copy and restored afterwards, also when the copy fails.
    pub fn copy_source_page<S, D>(
        &self,
        dst: &mut D,
        src: &mut S,
        page_index: usize,
        geometry: PageGeometry,
    ) -> Result<PageHandle, ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let size = ColumnPlanner::new(&self.ctx.tuning).destination_size(geometry.size());
        if !geometry.is_rotated() {
            return Self::place_source(dst, src, page_index, geometry, size).on_page(page_index);
        }

        log::debug!("Page {}: clearing rotation {} for the copy", page_index + 1, geometry.rotation);
        src.set_rotation(page_index, 0).on_page(page_index)?;
        let copied = Self::place_source(dst, src, page_index, geometry, size);
        let restored = src.set_rotation(page_index, geometry.rotation);
        let page = copied.on_page(page_index)?;
        restored.on_page(page_index)?;
        Ok(page)
    }

    fn place_source<S, D>(
        dst: &mut D,
        src: &S,
        page_index: usize,
        geometry: PageGeometry,
        size: Size,
    ) -> Result<PageHandle, DocumentError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let page = dst.new_page(size.width, size.height)?;
        let rect = Rect::new(0.0, 0.0, geometry.width, geometry.height);
        dst.show_source_page(page, rect, src, page_index)?;
        Ok(page)
    }

    /// Draws `fragments` into `rects` in order. What a column cannot hold is
    /// prepended to the next column; only the last column's overflow leaves
    /// the page.
    pub fn render_columns<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        page_index: usize,
        rects: &[Rect],
        fragments: Vec<String>,
        report: &mut PageReport,
    ) -> Result<ColumnsOutcome, ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let detector = OverflowDetector::new(&self.ctx.tuning);
        let style = self.ctx.flow_style();
        let mut states = vec![ColumnState::Pending; rects.len()];
        let mut carry = String::new();
        let mut last_column = 0;

        for (column, (rect, fragment)) in rects.iter().zip(fragments).enumerate() {
            let text = if carry.is_empty() {
                fragment
            } else {
                let mut joined = std::mem::take(&mut carry);
                joined.push_str(&fragment);
                joined
            };
            if text.is_empty() {
                continue;
            }
            last_column = column;
            if text.trim().is_empty() {
                // Nothing visible to draw; keep it so the chain still adds up.
                report.placed_fragments.push(text);
                states[column] = ColumnState::RenderedNoOverflow;
                continue;
            }

            let outcome = self.render_fragment::<S, D>(dst, page, page_index, column, *rect, &text, report)?;
            let detection = detector.detect::<S, D>(dst, page, rect, &text, &outcome, &style);
            log::debug!(
                "Page {}, column {column}: {} of {} chars placed ({:?})",
                page_index + 1,
                detection.placed_chars,
                char_len(&text),
                detection.source
            );

            let (placed, rest) = split_at_char(&text, detection.placed_chars);
            report.placed_fragments.push(placed.to_string());
            states[column] = if rest.is_empty() {
                ColumnState::RenderedNoOverflow
            } else {
                ColumnState::RenderedOverflow
            };
            carry = rest.to_string();
        }

        let leftover = if carry.is_empty() {
            None
        } else if carry.trim().is_empty() {
            report.placed_fragments.push(carry);
            None
        } else {
            Some(OverflowRecord {
                column: last_column,
                rect: rects[last_column],
                text: carry,
            })
        };
        Ok(ColumnsOutcome { states, leftover })
    }

    /// Draws one fragment. A markdown fragment whose markup the HTML box
    /// rejects is drawn again through the text box; other errors stop the
    /// page.
    #[allow(clippy::too_many_arguments)]
    fn render_fragment<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        page_index: usize,
        column: usize,
        rect: Rect,
        text: &str,
        report: &mut PageReport,
    ) -> Result<RenderOutcome, ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        if self.ctx.mode == RenderMode::Markdown {
            match MarkdownRenderer.render::<S, D>(dst, page, rect, text, self.ctx) {
                Ok(outcome) => return Ok(outcome),
                Err(DocumentError::Markup(reason)) => {
                    log::warn!(
                        "Page {}, column {column}: markdown rendering failed for {} chars, using plain text: {reason}",
                        page_index + 1,
                        char_len(text)
                    );
                    report.fallbacks += 1;
                }
                Err(e) => return Err(e).on_page(page_index),
            }
        }
        TextRenderer
            .render::<S, D>(dst, page, rect, text, self.ctx)
            .on_page(page_index)
    }
}
