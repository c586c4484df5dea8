//! # marginalia
//!
//! Lays explanation text out beside the pages of a PDF. Every source page is
//! copied onto a page three times as wide, and its explanation flows through
//! up to three columns on the right. Text that does not fit continues on
//! extra pages that repeat the source page under a "Continued from page N"
//! header.
//!
//! ```no_run
//! use marginalia::{ComposerBuilder, RenderMode, load_explanations};
//!
//! # fn main() -> Result<(), marginalia::ComposeError> {
//! let explanations = load_explanations("explanations.json")?;
//! let composer = ComposerBuilder::new()
//!     .with_font_size(11.0)
//!     .with_render_mode(RenderMode::Markdown)
//!     .build()?;
//! let report = composer.compose_file("slides.pdf", &explanations, "slides-explained.pdf")?;
//! println!("{} pages written", report.output_pages);
//! # Ok(())
//! # }
//! ```

pub mod explanations;
pub mod pipeline;

pub use explanations::{load_explanations, parse_explanations};
pub use pipeline::{ComposedDocument, Composer, ComposerBuilder, compose_pdf};

pub use marginalia_core::{
    ComposeError, ComposeOptions, CompositionReport, DocumentComposer, ExplanationMap,
    LayoutTuning, PageReport, RenderMode, ResolvedFont,
};

pub use marginalia_layout as layout;
pub use marginalia_pdf_composer as pdf;
pub use marginalia_resource as resource;
pub use marginalia_traits as traits;
pub use marginalia_types as types;
