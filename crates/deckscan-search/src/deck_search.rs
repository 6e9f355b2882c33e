//! Priority-ordered deck search over one luma frame.

use nalgebra::Point2;

use deckscan_core::{LumaImageView, Rect};
use deckscan_format::DeckFormat;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::mark_detect::{MarkDetector, MarkLocation};
use crate::mark_lines::{build_mark_lines, MarkLines, MAX_SAMPLE_ROWS};
use crate::matcher::match_code;
use crate::params::SearchParams;
use crate::search_lines::{materialize_line, SearchLines};
use crate::trace::trace_extents;

/// Margin applied to the physically expected deck height when bounding the
/// extent trace.
const EXPECTED_HEIGHT_MARGIN: f32 = 1.3;

/// Outcome of searching one frame.
#[derive(Clone, Debug)]
pub enum SearchResult {
    /// A deck matched, but its measured width cannot resolve the narrowest
    /// mark.
    TooSmall,
    /// No scan line produced an acceptable match.
    NotFound,
    /// Deck located and traced; ready for decoding.
    Decodable(MarkLines),
}

impl SearchResult {
    #[inline]
    pub fn is_decodable(&self) -> bool {
        matches!(self, SearchResult::Decodable(_))
    }
}

/// Stateful deck searcher.
///
/// Holds the generated scan-line list, detector scratch buffers and the
/// last-found deck center (used as the next frame's search origin).
#[derive(Debug)]
pub struct DeckSearch {
    params: SearchParams,
    lines: Option<SearchLines>,
    detector: MarkDetector,
    detected: Vec<MarkLocation>,
    last_center: Option<Point2<f32>>,
}

impl DeckSearch {
    pub fn new(params: SearchParams) -> Self {
        Self {
            params,
            lines: None,
            detector: MarkDetector::new(),
            detected: Vec::new(),
            last_center: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Replace the search parameters; the line list regenerates lazily.
    pub fn set_params(&mut self, params: SearchParams) {
        self.params = params;
    }

    /// Forget the previous deck location and force line regeneration.
    pub fn reset(&mut self) {
        self.last_center = None;
        self.lines = None;
    }

    /// Search `img` for a deck carrying `format`'s code.
    ///
    /// Lines are visited in weight order and the first accepted match wins,
    /// so the result is deterministic for a given frame and configuration.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img, format), fields(w = img.width, h = img.height, format = format.id()))
    )]
    pub fn search(&mut self, img: &LumaImageView<'_>, format: &DeckFormat) -> SearchResult {
        let rect = Rect::of_image(img.width, img.height);
        let reversible = format.is_reversible();

        let outdated = self
            .lines
            .as_ref()
            .map(|l| l.is_outdated(&self.params, img.width, img.height, reversible))
            .unwrap_or(true);
        if outdated {
            self.lines = Some(SearchLines::generate(
                &self.params,
                img.width,
                img.height,
                reversible,
            ));
        }
        let lines = self.lines.as_ref().expect("lines generated above");

        let origin = match self.last_center {
            Some(c) if rect.contains(c) => c,
            _ => rect.center(),
        };

        let code = format.code();
        let min_sample_width = code.calc_min_sample_width();
        let landmark_count = code.landmark_count();

        for spec in lines.specs() {
            let Some(line) = materialize_line(origin, spec.offset, spec.angle_degrees, &rect)
            else {
                continue;
            };
            if (line.sample_count() as f32) < min_sample_width {
                continue;
            }

            self.detector.detect(
                img,
                &line,
                format.invert_luma(),
                self.params.edge_minimum_threshold,
                &mut self.detected,
            );
            if self.detected.len() < landmark_count {
                continue;
            }

            let Some(deck_match) = match_code(
                code,
                &self.detected,
                self.params.max_deck_match_error,
            ) else {
                continue;
            };
            for &(def, m) in &deck_match.landmarks {
                self.detected[m].matched_definition = Some(def);
            }

            let span = deck_match.span();
            if span < min_sample_width {
                log::debug!(
                    "deck matched on line (offset {:.1}, angle {:.1}) but span {span:.1} < {min_sample_width:.1}",
                    spec.offset,
                    spec.angle_degrees
                );
                return SearchResult::TooSmall;
            }

            let expected_rows = expected_height_rows(format, span);
            let Some(extents) = trace_extents(
                img,
                &line,
                code,
                &deck_match,
                &self.detected,
                expected_rows,
                self.params.edge_minimum_threshold,
                format.invert_luma(),
            ) else {
                continue;
            };

            let mark_lines = build_mark_lines(
                img,
                code,
                &extents,
                span,
                format.invert_luma(),
                self.params.mark_line_average_offset_multiplier,
            );
            self.last_center = Some(mark_lines.center());

            log::debug!(
                "deck found: offset {:.1}, angle {:.1}, error {:.2}, {} rows",
                spec.offset,
                spec.angle_degrees,
                deck_match.error,
                mark_lines.rows
            );
            return SearchResult::Decodable(mark_lines);
        }

        SearchResult::NotFound
    }
}

/// Physically expected deck height in sample rows, from the measured width.
fn expected_height_rows(format: &DeckFormat, span_samples: f32) -> usize {
    let px_per_mm = span_samples / format.code().width_mm();
    let expected_mm = format.expected_stack_height_mm(format.max_card_count());
    ((px_per_mm * expected_mm * EXPECTED_HEIGHT_MARGIN) as usize).clamp(2, MAX_SAMPLE_ROWS)
}
