use crate::boundary::{byte_offset, char_len, find_split_point};
use crate::capacity::{CapacityEstimator, FlowStyle};
use crate::config::LayoutTuning;
use marginalia_types::Rect;

/// Partitions a text across column rectangles.
///
/// The concatenation of the returned fragments always equals the input
/// exactly; no whitespace is trimmed or injected at the cuts.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter<'a> {
    tuning: &'a LayoutTuning,
}

impl<'a> TextSplitter<'a> {
    pub fn new(tuning: &'a LayoutTuning) -> Self {
        Self { tuning }
    }

    /// Returns one fragment per rectangle.
    ///
    /// Every column but the last receives `max(capacity, proportional share)`
    /// characters, pulled back to a natural boundary when one lies late enough
    /// in the window. The last column takes whatever remains, even beyond its
    /// estimated capacity; real overflow is caught after rendering.
    pub fn split(&self, text: &str, rects: &[Rect], style: &FlowStyle) -> Vec<String> {
        let mut fragments = vec![String::new(); rects.len()];
        if rects.is_empty() || text.trim().is_empty() {
            return fragments;
        }
        if char_len(text) <= self.tuning.short_text_chars {
            fragments[0] = text.to_string();
            return fragments;
        }

        let estimator = CapacityEstimator::new(self.tuning);
        let capacities: Vec<usize> = rects
            .iter()
            .map(|rect| estimator.estimate_rect(rect, style))
            .collect();
        let mut total_capacity: usize = capacities.iter().sum();
        let mut remaining = text;
        let last = rects.len() - 1;

        for (column, &capacity) in capacities.iter().enumerate().take(last) {
            if remaining.is_empty() {
                break;
            }
            let remaining_chars = char_len(remaining);
            let share = if total_capacity > 0 {
                (remaining_chars as f64 * capacity as f64 / total_capacity as f64) as usize
            } else {
                remaining_chars
            };
            let target = capacity.max(share).min(remaining_chars);
            let window_end = byte_offset(remaining, target);

            let cut = if target < remaining_chars {
                find_split_point(&remaining[..window_end], self.tuning.boundary_window_ratio)
                    .unwrap_or(window_end)
            } else {
                window_end
            };

            log::debug!(
                "Column {column}: capacity {capacity}, target {target}, cut at byte {cut} of {}",
                remaining.len()
            );
            let (head, tail) = remaining.split_at(cut);
            fragments[column] = head.to_string();
            remaining = tail;
            total_capacity = total_capacity.saturating_sub(capacity);
        }

        fragments[last].push_str(remaining);
        fragments
    }
}
