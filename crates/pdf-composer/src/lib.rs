//! lopdf implementation of the document capabilities.
//!
//! - [`LopdfSource`] reads a PDF and exposes page geometry and rotation.
//! - [`LopdfDestination`] builds the output: source pages embedded as Form
//!   XObjects, wrapped text boxes, a small HTML box and embedded fonts.

mod copier;
mod css;
mod destination;
mod error;
mod fonts;
mod html;
mod source;
mod text;

#[cfg(test)]
mod test_utils;

pub use destination::LopdfDestination;
pub use error::ComposerError;
pub use source::LopdfSource;
