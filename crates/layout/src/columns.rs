use crate::capacity::{CapacityEstimator, FlowStyle};
use crate::config::LayoutTuning;
use marginalia_types::{Rect, Size};

const TEXT_MIN_BOTTOM_SAFE: f32 = 4.0;
const RICH_MIN_BOTTOM_SAFE: f32 = 8.0;
const RICH_MAX_BOTTOM_SAFE: f32 = 20.0;
const MIN_COLUMN_WIDTH: f32 = 20.0;
const MIN_COLUMN_LINES: f32 = 3.0;

/// Inputs for planning the columns of one destination page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRequest {
    /// Size of the source page shown on the left.
    pub page: Size,
    pub style: FlowStyle,
    /// Length of the text to place, see [`effective_length`].
    pub text_len: usize,
    /// Minimum internal padding on each side of a column.
    pub column_padding: f32,
    /// Extra space reserved above the columns, e.g. for a header.
    pub top_offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    /// The selected rectangles, left to right. Never empty.
    pub rects: Vec<Rect>,
    /// Aggregate estimated capacity of `rects`.
    pub capacity: usize,
    /// Size of the destination page.
    pub page: Size,
}

/// Length used for column selection: the trimmed length, or the raw length
/// when the text is whitespace only.
pub fn effective_length(text: &str) -> usize {
    match text.trim().chars().count() {
        0 => text.chars().count(),
        n => n,
    }
}

/// Derives column rectangles in the band to the right of the source page.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPlanner<'a> {
    tuning: &'a LayoutTuning,
}

impl<'a> ColumnPlanner<'a> {
    pub fn new(tuning: &'a LayoutTuning) -> Self {
        Self { tuning }
    }

    pub fn destination_size(&self, page: Size) -> Size {
        Size::new(page.width * self.tuning.width_multiplier, page.height)
    }

    /// All `max_columns` slots of the band, before any selection.
    pub fn candidate_rects(&self, request: &ColumnRequest) -> Vec<Rect> {
        let t = self.tuning;
        let style = &request.style;
        let font_size = style.font_size;
        let columns = t.max_columns.max(1);

        let band_x0 = request.page.width + t.margin_x;
        let band_x1 = request.page.width * t.width_multiplier - t.margin_x;
        let available = (band_x1 - band_x0).max(0.0);
        let gutters = t.column_gutter * (columns - 1) as f32;
        let slot_width = ((available - gutters) / columns as f32).max(0.0);

        let pad_left = request.column_padding.max((font_size * t.padding_left_em).floor());
        let pad_right = request.column_padding.max((font_size * t.padding_right_em).floor());

        let line_height = CapacityEstimator::new(t).line_height(style);
        let bottom_safe = if style.mode.is_rich() {
            (line_height * t.rich_bottom_safe_lines)
                .floor()
                .clamp(RICH_MIN_BOTTOM_SAFE, RICH_MAX_BOTTOM_SAFE)
        } else {
            (line_height * t.text_bottom_safe_lines)
                .floor()
                .max(TEXT_MIN_BOTTOM_SAFE)
        };
        let top = t.margin_y + request.top_offset;
        let mut bottom = request.page.height - t.margin_y - bottom_safe;
        if bottom <= top {
            bottom = top + (line_height * MIN_COLUMN_LINES).max(font_size * MIN_COLUMN_LINES);
        }

        (0..columns)
            .map(|i| {
                let slot_x0 = band_x0 + i as f32 * (slot_width + t.column_gutter);
                let x0 = slot_x0 + pad_left;
                let mut x1 = slot_x0 + slot_width - pad_right;
                if x1 <= x0 {
                    x1 = x0 + font_size.max(MIN_COLUMN_WIDTH);
                }
                Rect::new(x0, top, x1, bottom)
            })
            .collect()
    }

    /// Picks the smallest number of columns whose capacity, scaled by the
    /// fudge factor, holds the text.
    pub fn plan(&self, request: &ColumnRequest) -> ColumnPlan {
        let t = self.tuning;
        let estimator = CapacityEstimator::new(t);
        let candidates = self.candidate_rects(request);
        let capacities: Vec<usize> = candidates
            .iter()
            .map(|rect| estimator.estimate_rect(rect, &request.style))
            .collect();
        let fudge = if request.style.mode.is_rich() {
            t.rich_fudge
        } else {
            t.text_fudge
        };
        let text_len = request.text_len as f32;

        let mut selected = candidates.len();
        let mut cumulative = 0usize;
        for (i, capacity) in capacities.iter().enumerate() {
            cumulative += capacity;
            if text_len <= cumulative as f32 * fudge {
                selected = i + 1;
                break;
            }
        }

        let selected_capacity: usize = capacities[..selected].iter().sum();
        if selected < candidates.len() && text_len > selected_capacity as f32 * t.top_up_ratio {
            selected += 1;
        }

        let rects: Vec<Rect> = candidates.into_iter().take(selected).collect();
        let capacity = capacities[..rects.len()].iter().sum();
        log::debug!(
            "Planned {} of {} columns for {} chars (capacity {capacity})",
            rects.len(),
            t.max_columns,
            request.text_len
        );
        ColumnPlan {
            rects,
            capacity,
            page: self.destination_size(request.page),
        }
    }
}
