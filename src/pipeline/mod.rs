pub mod builder;
pub mod orchestrator;

pub use builder::ComposerBuilder;
pub use orchestrator::{ComposedDocument, Composer, compose_pdf};
