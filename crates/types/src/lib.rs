pub mod font;
pub mod geometry;
pub mod ids;
pub mod mode;

pub use font::{BuiltinFont, FontClass};
pub use geometry::{PageGeometry, Rect, Size};
pub use ids::PageHandle;
pub use mode::{ParseRenderModeError, RenderMode};

/// Explanation text per 0-based source page index.
pub type ExplanationMap = std::collections::BTreeMap<usize, String>;
