//! Pure layout algorithms for placing explanation text beside a source page.
//!
//! Nothing in this crate touches a PDF. Given page geometry and typesetting
//! parameters it answers three questions: how many characters fit in a
//! rectangle, which column rectangles to use, and where to cut a text into
//! per-column fragments. It also hosts the arithmetic behind overflow
//! estimation so that the estimator and the detector share one heuristic.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout tuning: {0}")]
    InvalidTuning(String),
}

pub mod boundary;
pub mod capacity;
pub mod columns;
pub mod config;
pub mod overflow;
pub mod splitter;

pub use capacity::{CapacityEstimator, FlowStyle};
pub use columns::{ColumnPlan, ColumnPlanner, ColumnRequest, effective_length};
pub use config::LayoutTuning;
pub use overflow::{GeometryReading, OverflowMath};
pub use splitter::TextSplitter;

// Re-export geometry so downstream crates do not need a direct dependency for it.
pub use marginalia_types::{FontClass, Rect, RenderMode, Size};
