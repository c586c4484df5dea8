//! Capability interfaces for the documents the composer reads and writes.
//!
//! The composer never talks to a PDF library directly. A source document
//! exposes page geometry; a destination document offers the drawing
//! primitives the layout engine needs. Tests drive the composer through fake
//! implementations of these traits.

use crate::resource::SharedResourceData;
use marginalia_types::{BuiltinFont, PageGeometry, PageHandle, Rect};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Unknown page handle: {0}")]
    UnknownPage(PageHandle),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The font a text or HTML box is drawn with.
#[derive(Clone, PartialEq)]
pub enum FontSource {
    Builtin(BuiltinFont),
    /// A TrueType/OpenType font embedded into the output.
    File {
        name: String,
        data: SharedResourceData,
    },
}

impl FontSource {
    pub fn name(&self) -> &str {
        match self {
            FontSource::Builtin(font) => font.base_font(),
            FontSource::File { name, .. } => name,
        }
    }
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Builtin(BuiltinFont::default())
    }
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Builtin(font) => f.debug_tuple("Builtin").field(font).finish(),
            FontSource::File { name, data } => f
                .debug_struct("File")
                .field("name", name)
                .field("bytes", &data.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontSource,
    pub font_size: f32,
    pub line_spacing: f32,
}

/// A rendered run of text and its bounding box, unclipped.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub bbox: Rect,
    pub text: String,
}

/// What a text box managed to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextBoxFit {
    AllDrawn,
    /// Drawing stopped at byte `offset` of the text. `overflow_width` is the
    /// summed advance, in points, of the undrawn remainder.
    StoppedAt { offset: usize, overflow_width: f32 },
    /// The backend only measures the undrawn remainder's advance width, in
    /// points; `0.0` means it saw no overflow.
    WidthOnly(f32),
}

impl TextBoxFit {
    pub fn overflow_width(&self) -> f32 {
        match self {
            TextBoxFit::AllDrawn => 0.0,
            TextBoxFit::StoppedAt { overflow_width, .. } => *overflow_width,
            TextBoxFit::WidthOnly(width) => *width,
        }
    }
}

/// What an HTML box managed to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HtmlBoxFit {
    /// The backend does not say; overflow has to be read from geometry.
    #[default]
    Unreported,
    AllDrawn,
    /// Content was cut at the bottom edge. `drawn_text` is the visible text
    /// drawn inside the rect, in reading order, without list markers.
    Clipped { drawn_text: String },
}

/// Read access to the document whose pages are being annotated.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    fn page_geometry(&self, index: usize) -> Result<PageGeometry, DocumentError>;

    /// Sets the page's rotation in degrees.
    fn set_rotation(&mut self, index: usize, degrees: i32) -> Result<(), DocumentError>;
}

/// The document being built.
///
/// Rectangles use a top-left origin with `y` growing downward, in points.
pub trait DestinationDocument<S: SourceDocument> {
    fn new_page(&mut self, width: f32, height: f32) -> Result<PageHandle, DocumentError>;

    /// Draws the full content of source page `index` into `rect`.
    fn show_source_page(
        &mut self,
        page: PageHandle,
        rect: Rect,
        source: &S,
        index: usize,
    ) -> Result<(), DocumentError>;

    /// Draws `text` wrapped into `rect`, clipped at its bottom edge.
    fn insert_text_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextBoxFit, DocumentError>;

    /// Lays out an HTML fragment styled by `css` into `rect`, clipped at its
    /// bottom edge. Everything laid out, clipped or not, shows up in
    /// [`DestinationDocument::text_blocks`].
    fn insert_html_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        html: &str,
        css: &str,
        font: &FontSource,
    ) -> Result<HtmlBoxFit, DocumentError>;

    /// Every text block drawn on the page so far.
    fn text_blocks(&self, page: PageHandle) -> Result<Vec<TextBlock>, DocumentError>;

    fn page_count(&self) -> usize;

    /// Serializes the document, compressing streams and dropping unused objects.
    fn save(self) -> Result<Vec<u8>, DocumentError>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn font_source_names() {
        assert_eq!(FontSource::default().name(), "Helvetica");
        let file = FontSource::File {
            name: "NotoSansSC".to_string(),
            data: Arc::new(vec![0; 16]),
        };
        assert_eq!(file.name(), "NotoSansSC");
    }

    #[test]
    fn debug_output_omits_font_bytes() {
        let file = FontSource::File {
            name: "Big".to_string(),
            data: Arc::new(vec![7; 4096]),
        };
        let debug = format!("{file:?}");
        assert!(debug.contains("4096"));
        assert!(!debug.contains("7, 7"));
    }

    #[test]
    fn fit_reports_expose_the_overflow_width() {
        assert_eq!(TextBoxFit::AllDrawn.overflow_width(), 0.0);
        assert_eq!(TextBoxFit::WidthOnly(12.5).overflow_width(), 12.5);
        let stopped = TextBoxFit::StoppedAt { offset: 40, overflow_width: 80.0 };
        assert_eq!(stopped.overflow_width(), 80.0);
        assert_eq!(HtmlBoxFit::default(), HtmlBoxFit::Unreported);
    }

    #[test]
    fn error_messages_carry_context() {
        let err = DocumentError::PageOutOfRange { index: 9, count: 3 };
        assert!(err.to_string().contains('9'));
        assert!(err.to_string().contains('3'));
        let err = DocumentError::UnknownPage(PageHandle::new(2));
        assert!(err.to_string().contains("page#2"));
    }
}
