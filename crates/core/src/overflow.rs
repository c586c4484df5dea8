//! Deciding how much of a drawn fragment did not fit.
//!
//! A backend that tracks where it stopped drawing settles the question
//! outright. Otherwise the estimating layers are tried in order and the
//! first one with a signal decides:
//!
//! 1. direct: the text box's measured overflow width,
//! 2. geometry: bounding boxes of what the HTML box drew,
//! 3. ratio: fragment length against estimated capacity,
//!
//! and when none of them defers anything, the defensive floor still defers
//! a small trailing slice of long fragments.
//!
//! Every cut leaves at least one character placed, so a column always makes
//! progress.

use crate::markdown::source_offset_after;
use crate::render::RenderOutcome;
use marginalia_layout::boundary::char_len;
use marginalia_layout::{CapacityEstimator, FlowStyle, GeometryReading, LayoutTuning, OverflowMath};
use marginalia_traits::{DestinationDocument, HtmlBoxFit, SourceDocument, TextBoxFit};
use marginalia_types::{PageHandle, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// The backend said where it stopped drawing.
    Reported,
    Direct,
    Geometry,
    Ratio,
    Defensive,
    /// No layer measured anything and none flagged overflow.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Characters of the fragment that stay in the column.
    pub placed_chars: usize,
    /// Characters deferred to the next column or page.
    pub deferred_chars: usize,
    pub source: DetectionSource,
}

impl Detection {
    pub fn has_overflow(&self) -> bool {
        self.deferred_chars > 0
    }
}

/// One layer's finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finding {
    /// Exactly this many leading chars were drawn.
    Drawn(usize),
    /// Roughly this many trailing chars did not fit; zero means none found.
    Estimated(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct OverflowDetector<'a> {
    math: OverflowMath<'a>,
    estimator: CapacityEstimator<'a>,
}

impl<'a> OverflowDetector<'a> {
    pub fn new(tuning: &'a LayoutTuning) -> Self {
        Self {
            math: OverflowMath::new(tuning),
            estimator: CapacityEstimator::new(tuning),
        }
    }

    pub fn detect<S, D>(
        &self,
        dst: &D,
        page: PageHandle,
        rect: &Rect,
        fragment: &str,
        outcome: &RenderOutcome,
        style: &FlowStyle,
    ) -> Detection
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let len = char_len(fragment);
        let (finding, source) = match outcome {
            RenderOutcome::TextBox(TextBoxFit::AllDrawn) => (Finding::Drawn(len), DetectionSource::Reported),
            RenderOutcome::TextBox(TextBoxFit::StoppedAt { offset, overflow_width }) => {
                match fragment.get(..*offset) {
                    Some(drawn) => (Finding::Drawn(char_len(drawn)), DetectionSource::Reported),
                    None => (
                        Finding::Estimated(self.direct(*overflow_width, style)),
                        DetectionSource::Direct,
                    ),
                }
            }
            RenderOutcome::TextBox(TextBoxFit::WidthOnly(width)) => (
                Finding::Estimated(self.direct(*width, style)),
                DetectionSource::Direct,
            ),
            RenderOutcome::HtmlBox(HtmlBoxFit::AllDrawn) => (Finding::Drawn(len), DetectionSource::Reported),
            RenderOutcome::HtmlBox(HtmlBoxFit::Clipped { drawn_text }) => {
                let offset = source_offset_after(fragment, drawn_text);
                (Finding::Drawn(char_len(&fragment[..offset])), DetectionSource::Reported)
            }
            RenderOutcome::HtmlBox(HtmlBoxFit::Unreported) => {
                match self.geometry::<S, D>(dst, page, rect, style) {
                    GeometryReading::Fits => (Finding::Estimated(0), DetectionSource::Geometry),
                    GeometryReading::Overflows(chars) => (Finding::Estimated(chars), DetectionSource::Geometry),
                    GeometryReading::Inconclusive => (
                        Finding::Estimated(self.ratio(len, rect, style)),
                        DetectionSource::Ratio,
                    ),
                }
            }
        };

        let (finding, source) = match finding {
            Finding::Estimated(0) => match self.defensive(len, style) {
                0 if source == DetectionSource::Ratio => (finding, DetectionSource::None),
                0 => (finding, source),
                chars => (Finding::Estimated(chars), DetectionSource::Defensive),
            },
            _ => (finding, source),
        };
        self.finish(fragment, len, finding, source)
    }

    /// Clamps the finding so one character stays. Estimated cuts move
    /// forward to a word boundary; reported ones are kept as they are.
    fn finish(&self, fragment: &str, len: usize, finding: Finding, source: DetectionSource) -> Detection {
        let placed_chars = match finding {
            Finding::Drawn(_) if len == 0 => 0,
            Finding::Drawn(drawn) => drawn.clamp(1, len),
            Finding::Estimated(chars) => {
                let chars = chars.min(len.saturating_sub(1));
                if chars == 0 {
                    len
                } else {
                    self.math.boundary_adjusted_cut(fragment, chars).clamp(1, len)
                }
            }
        };
        Detection {
            placed_chars,
            deferred_chars: len - placed_chars,
            source,
        }
    }

    /// Characters implied by a measured overflow width.
    pub fn direct(&self, overflow_width: f32, style: &FlowStyle) -> usize {
        self.math.direct_chars(overflow_width, style)
    }

    /// Reads back what the page holds below the column's bottom edge. A
    /// failed block query counts as no signal.
    pub fn geometry<S, D>(&self, dst: &D, page: PageHandle, rect: &Rect, style: &FlowStyle) -> GeometryReading
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        match dst.text_blocks(page) {
            Ok(blocks) => {
                let boxes: Vec<Rect> = blocks.into_iter().map(|b| b.bbox).collect();
                self.math.geometry(&boxes, rect, style)
            }
            Err(e) => {
                log::debug!("Text block query failed on {page}: {e}");
                GeometryReading::Inconclusive
            }
        }
    }

    pub fn ratio(&self, len: usize, rect: &Rect, style: &FlowStyle) -> usize {
        let capacity = self.estimator.estimate_rect(rect, style);
        self.math.ratio_chars(len, capacity)
    }

    pub fn defensive(&self, len: usize, style: &FlowStyle) -> usize {
        self.math.defensive_chars(len, style)
    }
}
