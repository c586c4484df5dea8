//! What a composition run did, page by page.

use serde::Serialize;

/// Outcome for one source page and its continuation chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageReport {
    pub page_index: usize,
    /// Columns used on the main page; 0 when nothing was drawn beside it.
    pub columns: usize,
    pub continuation_pages: usize,
    /// Every fragment placed on the page and its continuations, in order.
    pub placed_fragments: Vec<String>,
    /// Characters dropped when the continuation depth ran out.
    pub truncated_chars: usize,
    pub duplicate_guard_trips: usize,
    /// Markdown fragments redrawn as plain text.
    pub fallbacks: usize,
}

impl PageReport {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            ..Self::default()
        }
    }

    /// The placed fragments joined back together.
    pub fn placed_text(&self) -> String {
        self.placed_fragments.concat()
    }

    pub fn has_absorbed_issues(&self) -> bool {
        self.truncated_chars > 0 || self.duplicate_guard_trips > 0 || self.fallbacks > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositionReport {
    pub pages: Vec<PageReport>,
    /// Pages in the output document.
    pub output_pages: usize,
}

impl CompositionReport {
    pub fn page(&self, page_index: usize) -> Option<&PageReport> {
        self.pages.iter().find(|p| p.page_index == page_index)
    }

    pub fn continuation_pages(&self) -> usize {
        self.pages.iter().map(|p| p.continuation_pages).sum()
    }

    pub fn truncated_chars(&self) -> usize {
        self.pages.iter().map(|p| p.truncated_chars).sum()
    }

    pub fn duplicate_guard_trips(&self) -> usize {
        self.pages.iter().map(|p| p.duplicate_guard_trips).sum()
    }

    pub fn fallbacks(&self) -> usize {
        self.pages.iter().map(|p| p.fallbacks).sum()
    }

    pub fn has_absorbed_issues(&self) -> bool {
        self.pages.iter().any(PageReport::has_absorbed_issues)
    }
}
