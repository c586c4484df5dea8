use crate::error::ComposeError;
use marginalia_layout::LayoutTuning;
use marginalia_types::RenderMode;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const FONT_SIZE_RANGE: RangeInclusive<f32> = 8.0..=20.0;
pub const COLUMN_PADDING_RANGE: RangeInclusive<f32> = 0.0..=50.0;
pub const RIGHT_RATIO_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MAX_LINE_SPACING: f32 = 3.0;

/// Parameters of one composition run.
///
/// Deserializes from partial JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Accepted for compatibility and validated, but the layout does not use it.
    pub right_ratio: f32,
    pub font_size: f32,
    /// Built-in font name, font file path, or font name looked up through the
    /// resource provider. Helvetica when absent.
    pub font: Option<String>,
    pub render_mode: RenderMode,
    pub line_spacing: f32,
    /// Minimum padding inside each column, in points.
    pub column_padding: f32,
    pub tuning: LayoutTuning,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            right_ratio: 0.5,
            font_size: 12.0,
            font: None,
            render_mode: RenderMode::Text,
            line_spacing: 1.4,
            column_padding: 10.0,
            tuning: LayoutTuning::default(),
        }
    }
}

impl ComposeOptions {
    /// Rejects values outside their ranges before anything is rendered.
    pub fn validate(&self) -> Result<(), ComposeError> {
        if !FONT_SIZE_RANGE.contains(&self.font_size) {
            return Err(ComposeError::InvalidOptions(format!(
                "font_size must be between {} and {}, got {}",
                FONT_SIZE_RANGE.start(),
                FONT_SIZE_RANGE.end(),
                self.font_size
            )));
        }
        if !(self.line_spacing > 0.0 && self.line_spacing <= MAX_LINE_SPACING) {
            return Err(ComposeError::InvalidOptions(format!(
                "line_spacing must be greater than 0 and at most {MAX_LINE_SPACING}, got {}",
                self.line_spacing
            )));
        }
        if !RIGHT_RATIO_RANGE.contains(&self.right_ratio) {
            return Err(ComposeError::InvalidOptions(format!(
                "right_ratio must be between 0 and 1, got {}",
                self.right_ratio
            )));
        }
        if !COLUMN_PADDING_RANGE.contains(&self.column_padding) {
            return Err(ComposeError::InvalidOptions(format!(
                "column_padding must be between {} and {}, got {}",
                COLUMN_PADDING_RANGE.start(),
                COLUMN_PADDING_RANGE.end(),
                self.column_padding
            )));
        }
        self.tuning.validate()?;
        Ok(())
    }
}
