use crate::LayoutError;
use serde::{Deserialize, Serialize};

/// Every empirically tuned constant of the layout and overflow heuristics.
///
/// The defaults reproduce the reference behaviour. None of the values is
/// derived from first principles; they are conservative enough to avoid
/// visible truncation in common documents. Partial JSON documents are
/// accepted, missing fields keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    // --- Destination page geometry ---
    /// Destination page width as a multiple of the source page width.
    ///
    /// Defaults to `3.0`.
    pub width_multiplier: f32,
    /// Horizontal margin on both sides of the explanation band.
    ///
    /// Defaults to `25.0`.
    pub margin_x: f32,
    /// Top and bottom margin of every column.
    ///
    /// Defaults to `40.0`.
    pub margin_y: f32,
    /// Gap between two adjacent column slots.
    ///
    /// Defaults to `12.0`.
    pub column_gutter: f32,
    /// Upper bound on the number of columns in the band.
    ///
    /// Defaults to `3`.
    pub max_columns: usize,
    /// Minimum left padding inside a column, in multiples of the font size.
    pub padding_left_em: f32,
    /// Minimum right padding inside a column, in multiples of the font size.
    pub padding_right_em: f32,
    /// Bottom safety strip for plain text, in line heights (at least 4pt).
    pub text_bottom_safe_lines: f32,
    /// Bottom safety strip for rich text, in line heights (8pt to 20pt).
    pub rich_bottom_safe_lines: f32,

    // --- Capacity estimation ---
    /// Average glyph advance of Latin fonts, in multiples of the font size.
    pub latin_char_width: f32,
    /// Average glyph advance of CJK-dense fonts, in multiples of the font size.
    pub cjk_char_width: f32,
    /// Extra line height budget for headings and paragraph gaps in rich text.
    pub rich_line_height_factor: f32,
    /// Scaling applied to the raw `chars_per_line * lines` capacity.
    pub capacity_scale: f32,
    /// Permissive scaling used when the conservative estimate is small.
    pub small_capacity_scale: f32,
    /// Capacity below which `small_capacity_scale` applies.
    pub small_capacity_threshold: usize,

    // --- Column selection ---
    /// Fraction of the aggregate capacity plain text may use.
    pub text_fudge: f32,
    /// Fraction of the aggregate capacity rich text may use.
    pub rich_fudge: f32,
    /// Fill ratio above which one more column is added when available.
    pub top_up_ratio: f32,

    // --- Splitting ---
    /// Texts up to this many characters are never split.
    ///
    /// Defaults to `500`.
    pub short_text_chars: usize,
    /// A boundary must lie past this fraction of the window to be used.
    pub boundary_window_ratio: f32,

    // --- Overflow estimation ---
    /// Safety multiplier on characters derived from a reported overflow width.
    pub direct_overflow_scale: f32,
    /// The boundary search window after a direct cut is `chars / divisor`...
    pub direct_window_divisor: usize,
    /// ...capped at this many characters.
    pub direct_window_max: usize,
    /// Horizontal tolerance when matching rendered blocks to a column.
    pub geometry_x_tolerance: f32,
    /// How many line heights above the column a matched block may start.
    pub geometry_lead_lines: f32,
    /// Excess below the column bottom tolerated before overflow is declared, in line heights.
    pub geometry_bottom_tolerance: f32,
    /// Safety multiplier on characters derived from excess block height.
    pub geometry_safety: f32,
    /// Capacity under which `ratio_small` is the fill threshold.
    pub ratio_small_capacity: usize,
    /// Capacity under which `ratio_medium` is the fill threshold.
    pub ratio_medium_capacity: usize,
    pub ratio_small: f32,
    pub ratio_medium: f32,
    pub ratio_large: f32,
    /// Bounds of the deferred share when the fill threshold is exceeded.
    pub ratio_min_share: f32,
    pub ratio_max_share: f32,
    /// Fragments longer than `max(defensive_min_chars, font_size * defensive_em_chars)`
    /// defer a trailing slice when no measurement is available.
    pub defensive_min_chars: usize,
    pub defensive_em_chars: f32,
    pub defensive_share: f32,

    // --- Continuation pages ---
    /// Maximum number of continuation pages per source page.
    ///
    /// Defaults to `5`.
    pub max_continuation_depth: usize,
    /// Vertical space reserved for the continuation header, in font sizes.
    pub header_lines: f32,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            width_multiplier: 3.0,
            margin_x: 25.0,
            margin_y: 40.0,
            column_gutter: 12.0,
            max_columns: 3,
            padding_left_em: 1.2,
            padding_right_em: 0.6,
            text_bottom_safe_lines: 0.5,
            rich_bottom_safe_lines: 0.8,

            latin_char_width: 0.45,
            cjk_char_width: 0.55,
            rich_line_height_factor: 1.15,
            capacity_scale: 0.5,
            small_capacity_scale: 0.7,
            small_capacity_threshold: 50,

            text_fudge: 0.6,
            rich_fudge: 0.5,
            top_up_ratio: 0.8,

            short_text_chars: 500,
            boundary_window_ratio: 0.7,

            direct_overflow_scale: 1.2,
            direct_window_divisor: 8,
            direct_window_max: 60,
            geometry_x_tolerance: 10.0,
            geometry_lead_lines: 2.0,
            geometry_bottom_tolerance: 0.05,
            geometry_safety: 1.25,
            ratio_small_capacity: 100,
            ratio_medium_capacity: 300,
            ratio_small: 0.80,
            ratio_medium: 0.85,
            ratio_large: 0.90,
            ratio_min_share: 0.15,
            ratio_max_share: 0.4,
            defensive_min_chars: 150,
            defensive_em_chars: 10.0,
            defensive_share: 0.05,

            max_continuation_depth: 5,
            header_lines: 2.0,
        }
    }
}

impl LayoutTuning {
    /// Checks the values that would make the heuristics divide by zero or
    /// produce no usable column.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = [
            ("width_multiplier", self.width_multiplier),
            ("latin_char_width", self.latin_char_width),
            ("cjk_char_width", self.cjk_char_width),
            ("rich_line_height_factor", self.rich_line_height_factor),
            ("capacity_scale", self.capacity_scale),
            ("small_capacity_scale", self.small_capacity_scale),
            ("text_fudge", self.text_fudge),
            ("rich_fudge", self.rich_fudge),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidTuning(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.width_multiplier <= 1.0 {
            return Err(LayoutError::InvalidTuning(format!(
                "width_multiplier must exceed 1.0 to leave room for explanations, got {}",
                self.width_multiplier
            )));
        }
        if self.max_columns == 0 {
            return Err(LayoutError::InvalidTuning(
                "max_columns must be at least 1".to_string(),
            ));
        }
        if self.direct_window_divisor == 0 {
            return Err(LayoutError::InvalidTuning(
                "direct_window_divisor must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.boundary_window_ratio) {
            return Err(LayoutError::InvalidTuning(format!(
                "boundary_window_ratio must lie in [0, 1], got {}",
                self.boundary_window_ratio
            )));
        }
        if self.ratio_min_share > self.ratio_max_share {
            return Err(LayoutError::InvalidTuning(format!(
                "ratio_min_share ({}) exceeds ratio_max_share ({})",
                self.ratio_min_share, self.ratio_max_share
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LayoutTuning::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let tuning: LayoutTuning =
            serde_json::from_str(r#"{ "max_columns": 2, "max_continuation_depth": 3 }"#).unwrap();
        assert_eq!(tuning.max_columns, 2);
        assert_eq!(tuning.max_continuation_depth, 3);
        assert_eq!(tuning.width_multiplier, 3.0);
        assert_eq!(tuning.short_text_chars, 500);
    }

    #[test]
    fn rejects_zero_columns() {
        let tuning = LayoutTuning {
            max_columns: 0,
            ..Default::default()
        };
        assert!(matches!(tuning.validate(), Err(LayoutError::InvalidTuning(_))));
    }

    #[test]
    fn rejects_narrow_multiplier() {
        let tuning = LayoutTuning {
            width_multiplier: 1.0,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("width_multiplier"));
    }

    #[test]
    fn rejects_inverted_share_bounds() {
        let tuning = LayoutTuning {
            ratio_min_share: 0.5,
            ratio_max_share: 0.2,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }
}
