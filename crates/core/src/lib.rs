//! # marginalia-core
//!
//! Lays explanation text out beside the pages of a source document.
//!
//! For every source page the composer adds a page three times as wide,
//! draws the original on the left and flows the page's explanation through
//! up to three columns on the right. Text that does not fit goes to
//! continuation pages, which repeat the original with a header.
//!
//! - **composer**: [`DocumentComposer`], the per-document driver
//! - **page**: [`PageRenderer`], one page and its column flow
//! - **overflow**: the layered overflow detector
//! - **continuation**: the bounded continuation loop
//! - **render**: one [`FragmentRenderer`] per render mode
//!
//! The crate never touches a PDF library; documents come in through the
//! `marginalia-traits` capabilities.

pub use marginalia_layout as layout;
pub use marginalia_traits as traits;
pub use marginalia_types as types;

pub mod composer;
pub mod continuation;
pub mod error;
pub mod fonts;
pub mod markdown;
pub mod options;
pub mod overflow;
pub mod page;
pub mod render;
pub mod report;
pub mod templates;

pub use composer::DocumentComposer;
pub use continuation::{ContinuationEngine, ProcessedTextRegistry};
pub use error::ComposeError;
pub use fonts::{ResolvedFont, resolve_font};
pub use options::ComposeOptions;
pub use overflow::{Detection, DetectionSource, OverflowDetector};
pub use page::{ColumnState, ColumnsOutcome, OverflowRecord, PageRenderer};
pub use render::{FragmentRenderer, MarkdownRenderer, RenderContext, RenderOutcome, TextRenderer};
pub use report::{CompositionReport, PageReport};

pub use marginalia_layout::LayoutTuning;
pub use marginalia_types::{ExplanationMap, RenderMode};

#[cfg(test)]
mod test_utils;
