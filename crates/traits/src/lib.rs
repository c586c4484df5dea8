pub mod document;
pub mod resource;

pub use document::{
    DestinationDocument, DocumentError, FontSource, HtmlBoxFit, SourceDocument, TextBlock, TextBoxFit,
    TextStyle,
};
pub use resource::{InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData};
