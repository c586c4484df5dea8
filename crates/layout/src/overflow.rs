//! Arithmetic behind each overflow-detection layer.
//!
//! Each function turns one kind of evidence into a number of characters to
//! defer. Combining the layers, and guaranteeing progress, is the caller's job.

use crate::boundary::{char_len, find_forward_boundary};
use crate::capacity::{CapacityEstimator, FlowStyle};
use crate::config::LayoutTuning;
use marginalia_types::Rect;

/// Outcome of inspecting rendered block geometry for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryReading {
    /// No rendered block could be attributed to the column.
    Inconclusive,
    Fits,
    Overflows(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct OverflowMath<'a> {
    tuning: &'a LayoutTuning,
    estimator: CapacityEstimator<'a>,
}

impl<'a> OverflowMath<'a> {
    pub fn new(tuning: &'a LayoutTuning) -> Self {
        Self {
            tuning,
            estimator: CapacityEstimator::new(tuning),
        }
    }

    /// Characters represented by an overflow width reported by the text box.
    pub fn direct_chars(&self, overflow_width: f32, style: &FlowStyle) -> usize {
        let char_width = self.estimator.char_width(style);
        if !(overflow_width > 0.0) || !(char_width > 0.0) {
            return 0;
        }
        (overflow_width / char_width * self.tuning.direct_overflow_scale).ceil() as usize
    }

    /// Character index at which to cut `text` so that roughly `overflow_chars`
    /// are deferred, moved forward to a nearby boundary when there is one.
    pub fn boundary_adjusted_cut(&self, text: &str, overflow_chars: usize) -> usize {
        let len = char_len(text);
        if overflow_chars == 0 {
            return len;
        }
        let cut = len.saturating_sub(overflow_chars);
        let window = (overflow_chars / self.tuning.direct_window_divisor.max(1))
            .min(self.tuning.direct_window_max);
        find_forward_boundary(text, cut, window)
            .filter(|&adjusted| adjusted < len)
            .unwrap_or(cut)
    }

    /// Compares rendered block boxes with the column rectangle.
    ///
    /// A block belongs to the column when its horizontal centre lies within
    /// the rectangle (plus tolerance), it starts no more than a couple of
    /// lines above the rectangle, and it ends below the rectangle's top.
    pub fn geometry(&self, blocks: &[Rect], rect: &Rect, style: &FlowStyle) -> GeometryReading {
        let t = self.tuning;
        let line_height = self.estimator.line_height(style);
        let tolerance = t.geometry_x_tolerance;
        let earliest_top = rect.y0 - t.geometry_lead_lines * line_height;

        let lowest_bottom = blocks
            .iter()
            .filter(|b| {
                let cx = b.center_x();
                cx >= rect.x0 - tolerance
                    && cx <= rect.x1 + tolerance
                    && b.y0 >= earliest_top
                    && b.y1 > rect.y0
            })
            .map(|b| b.y1)
            .fold(None, |acc: Option<f32>, y| Some(acc.map_or(y, |a| a.max(y))));

        let Some(bottom) = lowest_bottom else {
            return GeometryReading::Inconclusive;
        };
        if bottom <= rect.y1 + t.geometry_bottom_tolerance * line_height || line_height <= 0.0 {
            return GeometryReading::Fits;
        }
        let excess_lines = ((bottom - rect.y1) / line_height).ceil();
        let per_line = self.estimator.chars_per_line(rect.width(), style) as f32;
        let chars = (excess_lines * per_line * t.geometry_safety).ceil() as usize;
        GeometryReading::Overflows(chars.max(1))
    }

    /// Fill threshold for a column of the given capacity.
    pub fn ratio_threshold(&self, capacity: usize) -> f32 {
        let t = self.tuning;
        if capacity < t.ratio_small_capacity {
            t.ratio_small
        } else if capacity < t.ratio_medium_capacity {
            t.ratio_medium
        } else {
            t.ratio_large
        }
    }

    /// Characters to defer when a fragment of `len` characters exceeds the
    /// fill threshold of a column with `capacity`; 0 otherwise.
    pub fn ratio_chars(&self, len: usize, capacity: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let limit = capacity as f32 * self.ratio_threshold(capacity);
        if (len as f32) <= limit {
            return 0;
        }
        let share = ((len as f32 - limit) / len as f32)
            .clamp(self.tuning.ratio_min_share, self.tuning.ratio_max_share);
        (len as f32 * share).ceil() as usize
    }

    /// Trailing slice deferred from long fragments when nothing was measured.
    pub fn defensive_chars(&self, len: usize, style: &FlowStyle) -> usize {
        let t = self.tuning;
        let threshold = (t.defensive_min_chars as f32).max(style.font_size * t.defensive_em_chars);
        if (len as f32) <= threshold {
            return 0;
        }
        ((len as f32 * t.defensive_share).ceil() as usize).max(1)
    }
}
