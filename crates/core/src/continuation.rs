//! Continuation pages for text the main page could not hold.
//!
//! Each round copies the source page again, draws a header naming the page
//! being continued, and flows the leftover through fresh columns below it.
//! The loop ends when nothing is left, when the depth budget is spent, or
//! when every leftover has been seen before on this chain.

use crate::error::{ComposeError, PageContext};
use crate::page::{OverflowRecord, PageRenderer};
use crate::report::PageReport;
use marginalia_layout::TextSplitter;
use marginalia_layout::boundary::char_len;
use marginalia_traits::{DestinationDocument, SourceDocument, TextStyle};
use marginalia_types::{PageGeometry, PageHandle, Rect};
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

/// Content hashes of the fragments already sent to a continuation page of
/// the current source page.
#[derive(Debug, Default)]
pub struct ProcessedTextRegistry {
    seen: FxHashSet<u64>,
}

impl ProcessedTextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `text`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, text: &str) -> bool {
        self.seen.insert(content_hash(text))
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(&content_hash(text))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn content_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Header text for the `sequence`th (1-based) continuation of a page.
pub fn continuation_header(page_index: usize, sequence: usize) -> String {
    format!("Continued from page {} ({})", page_index + 1, continuation_label(sequence))
}

pub fn continuation_label(sequence: usize) -> String {
    match sequence {
        0 | 1 => "continuation".to_string(),
        n => format!("continuation-{n}"),
    }
}

pub struct ContinuationEngine<'r, 'c> {
    renderer: &'r PageRenderer<'c>,
}

impl<'r, 'c> ContinuationEngine<'r, 'c> {
    pub fn new(renderer: &'r PageRenderer<'c>) -> Self {
        Self { renderer }
    }

    pub fn run<S, D>(
        &self,
        dst: &mut D,
        src: &mut S,
        page_index: usize,
        geometry: PageGeometry,
        leftover: OverflowRecord,
        report: &mut PageReport,
    ) -> Result<(), ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let ctx = self.renderer.context();
        let mut registry = ProcessedTextRegistry::new();
        let mut pending = vec![leftover];
        let mut depth_remaining = ctx.tuning.max_continuation_depth;

        loop {
            pending.retain(|record| !record.text.is_empty());
            if pending.is_empty() {
                break;
            }
            if depth_remaining == 0 {
                let dropped: usize = pending.iter().map(|r| char_len(&r.text)).sum();
                log::warn!(
                    "Page {}: continuation depth {} exhausted, dropping {dropped} chars",
                    page_index + 1,
                    ctx.tuning.max_continuation_depth
                );
                report.truncated_chars += dropped;
                break;
            }

            let mut text = String::new();
            for record in pending.drain(..) {
                if registry.insert(&record.text) {
                    text.push_str(&record.text);
                } else {
                    log::warn!(
                        "Page {}, column {}: {} chars were already continued, skipping",
                        page_index + 1,
                        record.column,
                        char_len(&record.text)
                    );
                    report.duplicate_guard_trips += 1;
                }
            }
            if text.is_empty() {
                break;
            }

            let sequence = report.continuation_pages + 1;
            let page = self.renderer.copy_source_page(dst, src, page_index, geometry)?;
            report.continuation_pages = sequence;

            let header_height = ctx.tuning.header_lines * ctx.font_size;
            let plan = self.renderer.plan(geometry, &text, header_height);
            if let Some(first) = plan.rects.first() {
                self.draw_header::<S, D>(dst, page, page_index, sequence, first, header_height)?;
            }
            log::debug!(
                "Page {} {}: {} chars over {} columns",
                page_index + 1,
                continuation_label(sequence),
                char_len(&text),
                plan.rects.len()
            );

            let fragments = TextSplitter::new(&ctx.tuning).split(&text, &plan.rects, &ctx.flow_style());
            let outcome = self
                .renderer
                .render_columns::<S, D>(dst, page, page_index, &plan.rects, fragments, report)?;
            pending.extend(outcome.leftover);
            depth_remaining -= 1;
        }
        Ok(())
    }

    /// Draws the header in the band above the first column.
    fn draw_header<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        page_index: usize,
        sequence: usize,
        first_column: &Rect,
        header_height: f32,
    ) -> Result<(), ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let ctx = self.renderer.context();
        let top = first_column.y0 - header_height;
        let rect = Rect::new(first_column.x0, top, first_column.x1, first_column.y0);
        // Single spacing keeps the header's box above the column, out of the
        // geometry check.
        let style = TextStyle {
            line_spacing: 1.0,
            ..ctx.text_style()
        };
        dst.insert_text_box(page, rect, &continuation_header(page_index, sequence), &style)
            .on_page(page_index)?;
        Ok(())
    }
}
