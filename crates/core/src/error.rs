//! Errors surfaced by a composition run.
//!
//! Most problems met while composing are absorbed (logged and counted in the
//! report). What remains here stops the run.

use marginalia_layout::LayoutError;
use marginalia_traits::DocumentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Source document is unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Page {page_index}: {source}")]
    Document {
        page_index: usize,
        #[source]
        source: DocumentError,
    },

    #[error("Failed to write the output document: {0}")]
    Output(#[source] DocumentError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LayoutError> for ComposeError {
    fn from(e: LayoutError) -> Self {
        ComposeError::InvalidOptions(e.to_string())
    }
}

/// Attaches a page index to document errors.
pub(crate) trait PageContext<T> {
    fn on_page(self, page_index: usize) -> Result<T, ComposeError>;
}

impl<T> PageContext<T> for Result<T, DocumentError> {
    fn on_page(self, page_index: usize) -> Result<T, ComposeError> {
        self.map_err(|source| ComposeError::Document { page_index, source })
    }
}
