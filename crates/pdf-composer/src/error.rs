use marginalia_traits::DocumentError;
use marginalia_types::PageHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Unknown page handle: {0}")]
    UnknownPage(PageHandle),

    #[error("Page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("{0}")]
    Other(String),
}

impl From<ComposerError> for DocumentError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Pdf(e) => DocumentError::Pdf(e.to_string()),
            ComposerError::Io(e) => DocumentError::Io(e),
            ComposerError::Font(msg) => DocumentError::Font(msg),
            ComposerError::Markup(msg) => DocumentError::Markup(msg),
            ComposerError::UnknownPage(page) => DocumentError::UnknownPage(page),
            ComposerError::PageOutOfRange { index, count } => {
                DocumentError::PageOutOfRange { index, count }
            }
            ComposerError::Other(msg) => DocumentError::Pdf(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_keep_their_kind() {
        let err: ComposerError = io::Error::new(io::ErrorKind::WriteZero, "disk full").into();
        match DocumentError::from(err) {
            DocumentError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn markup_errors_stay_markup_errors() {
        let err = DocumentError::from(ComposerError::Markup("unclosed <b>".to_string()));
        assert!(matches!(err, DocumentError::Markup(_)));
    }
}
