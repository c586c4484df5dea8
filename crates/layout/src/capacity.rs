use crate::config::LayoutTuning;
use marginalia_types::{FontClass, Rect, RenderMode};

/// Typesetting parameters that every capacity calculation depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStyle {
    pub font_size: f32,
    pub line_spacing: f32,
    pub mode: RenderMode,
    pub font_class: FontClass,
}

impl FlowStyle {
    pub fn new(font_size: f32, line_spacing: f32, mode: RenderMode) -> Self {
        Self {
            font_size,
            line_spacing,
            mode,
            font_class: FontClass::Latin,
        }
    }

    pub fn with_font_class(mut self, font_class: FontClass) -> Self {
        self.font_class = font_class;
        self
    }
}

/// Estimates how many characters of text a rectangle can hold.
///
/// The estimate is deliberately pessimistic: the renderer's real overflow
/// report or block geometry has the final word, the estimate only decides
/// column counts and split points.
#[derive(Debug, Clone, Copy)]
pub struct CapacityEstimator<'a> {
    tuning: &'a LayoutTuning,
}

impl<'a> CapacityEstimator<'a> {
    pub fn new(tuning: &'a LayoutTuning) -> Self {
        Self { tuning }
    }

    /// Average advance of one character, in points.
    pub fn char_width(&self, style: &FlowStyle) -> f32 {
        let factor = match style.font_class {
            FontClass::Latin => self.tuning.latin_char_width,
            FontClass::Cjk => self.tuning.cjk_char_width,
        };
        style.font_size * factor
    }

    pub fn line_height(&self, style: &FlowStyle) -> f32 {
        let base = style.font_size * style.line_spacing.max(1.0);
        if style.mode.is_rich() {
            base * self.tuning.rich_line_height_factor
        } else {
            base
        }
    }

    /// Characters per line, at least 1 for any usable input.
    pub fn chars_per_line(&self, width: f32, style: &FlowStyle) -> usize {
        let char_width = self.char_width(style);
        if !usable(width) || !usable(char_width) {
            return 0;
        }
        ((width / char_width).floor() as usize).max(1)
    }

    pub fn lines(&self, height: f32, style: &FlowStyle) -> usize {
        let line_height = self.line_height(style);
        if !usable(height) || !usable(line_height) {
            return 0;
        }
        ((height / line_height).floor() as usize).max(1)
    }

    /// Character capacity of a `width` x `height` region.
    ///
    /// Returns 0 for degenerate input. The result is non-decreasing in width
    /// and height and non-increasing in font size.
    pub fn estimate(&self, width: f32, height: f32, style: &FlowStyle) -> usize {
        if !usable(width) || !usable(height) || !usable(style.font_size) {
            return 0;
        }
        let raw = self.chars_per_line(width, style) * self.lines(height, style);
        let threshold = self.tuning.small_capacity_threshold;
        let scaled = (raw as f32 * self.tuning.capacity_scale).floor() as usize;
        if scaled >= threshold {
            return scaled;
        }
        // Capped at the threshold so the boost cannot overtake a larger region.
        let boosted = ((raw as f32 * self.tuning.small_capacity_scale).floor() as usize).min(threshold);
        scaled.max(boosted).max(1)
    }

    pub fn estimate_rect(&self, rect: &Rect, style: &FlowStyle) -> usize {
        self.estimate(rect.width(), rect.height(), style)
    }
}

fn usable(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(font_size: f32) -> FlowStyle {
        FlowStyle::new(font_size, 1.2, RenderMode::Text)
    }

    #[test]
    fn degenerate_inputs_return_zero() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        assert_eq!(est.estimate(0.0, 100.0, &style(12.0)), 0);
        assert_eq!(est.estimate(100.0, -5.0, &style(12.0)), 0);
        assert_eq!(est.estimate(100.0, 100.0, &style(0.0)), 0);
        assert_eq!(est.estimate(f32::NAN, 100.0, &style(12.0)), 0);
        assert_eq!(est.estimate(100.0, f32::INFINITY, &style(12.0)), 0);
    }

    #[test]
    fn typical_column_capacity() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        // 200pt / (12 * 0.45) = 37 chars per line, 400 / 14.4 = 27 lines.
        let cap = est.estimate(200.0, 400.0, &style(12.0));
        assert_eq!(cap, (37 * 27) / 2);
    }

    #[test]
    fn small_regions_use_permissive_scale() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        // 30pt wide -> 5 chars per line, 3 lines -> raw 15.
        let cap = est.estimate(30.0, 45.0, &style(12.0));
        assert_eq!(cap, 10);
    }

    #[test]
    fn rich_text_budgets_taller_lines() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        let plain = est.estimate(300.0, 600.0, &style(12.0));
        let rich = est.estimate(
            300.0,
            600.0,
            &FlowStyle::new(12.0, 1.2, RenderMode::Markdown),
        );
        assert!(rich < plain);
    }

    #[test]
    fn cjk_fonts_hold_fewer_characters() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        let latin = est.estimate(300.0, 600.0, &style(12.0));
        let cjk = est.estimate(300.0, 600.0, &style(12.0).with_font_class(FontClass::Cjk));
        assert!(cjk < latin);
    }

    #[test]
    fn line_spacing_below_one_does_not_shrink_lines() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        let tight = FlowStyle::new(10.0, 0.6, RenderMode::Text);
        assert_eq!(est.line_height(&tight), 10.0);
    }

    #[test]
    fn monotone_in_width_and_height() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        let s = style(12.0);
        let mut previous = 0;
        for w in 1..600 {
            let cap = est.estimate(w as f32, 120.0, &s);
            assert!(cap >= previous, "width {w}: {cap} < {previous}");
            previous = cap;
        }
        previous = 0;
        for h in 1..600 {
            let cap = est.estimate(90.0, h as f32, &s);
            assert!(cap >= previous, "height {h}: {cap} < {previous}");
            previous = cap;
        }
    }

    #[test]
    fn non_increasing_in_font_size() {
        let tuning = LayoutTuning::default();
        let est = CapacityEstimator::new(&tuning);
        let mut previous = usize::MAX;
        for tenth in 40..400 {
            let cap = est.estimate(150.0, 300.0, &style(tenth as f32 / 10.0));
            assert!(cap <= previous, "font size {}: {cap} > {previous}", tenth as f32 / 10.0);
            previous = cap;
        }
    }
}
