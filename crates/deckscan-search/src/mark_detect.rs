//! Mark detection along one scan line.

use deckscan_core::{LumaImageView, SampleLine};

/// One detected dark mark along a scan line.
///
/// Positions are in sample space (fractional sample indices); normalized
/// positions divide by the last sample index. `matched_definition` is filled
/// in by the code matcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkLocation {
    /// Index of this mark among the marks detected on its line.
    pub scan_index: usize,
    pub start: f32,
    pub end: f32,
    pub normalized_start: f32,
    pub normalized_end: f32,
    pub matched_definition: Option<usize>,
}

impl MarkLocation {
    #[inline]
    pub fn center(&self) -> f32 {
        0.5 * (self.start + self.end)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    #[inline]
    pub fn normalized_center(&self) -> f32 {
        0.5 * (self.normalized_start + self.normalized_end)
    }
}

/// Half-width of the finite-difference slope window, in samples.
const SLOPE_HALF_WINDOW: usize = 2;
/// Half-width of the rolling min/max window, in samples.
const RANGE_HALF_WINDOW: usize = 8;

/// Reusable mark detector. Scratch buffers persist across lines so the hot
/// path stays allocation-free once warmed up.
#[derive(Debug, Default)]
pub struct MarkDetector {
    luma: Vec<u8>,
    slope: Vec<i16>,
    range_lo: Vec<u8>,
    range_hi: Vec<u8>,
}

impl MarkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect dark marks along `line`, appending to `out` (cleared first).
    ///
    /// `invert` flips luma polarity first so that marks are always the dark
    /// phase. `edge_minimum_threshold` is the minimum local luma range for an
    /// edge to exist at all.
    pub fn detect(
        &mut self,
        img: &LumaImageView<'_>,
        line: &SampleLine,
        invert: bool,
        edge_minimum_threshold: u8,
        out: &mut Vec<MarkLocation>,
    ) {
        out.clear();
        let n = line.sample_count();
        if n < 2 * (SLOPE_HALF_WINDOW + 1) {
            return;
        }

        self.luma.clear();
        self.luma.reserve(n);
        for i in 0..n {
            let v = line.sample(img, i);
            self.luma.push(if invert { 255 - v } else { v });
        }

        self.fill_slope();
        self.fill_rolling_range();

        let norm = (n - 1) as f32;
        let edge_min = edge_minimum_threshold as i32;

        // Pair falling edges (entering a dark mark) with the next rising
        // edge. Extra events of the same polarity are ignored.
        let mut open_start: Option<f32> = None;
        for i in 1..n - 1 {
            let range = self.range_hi[i] as i32 - self.range_lo[i] as i32;
            if range < edge_min {
                continue;
            }
            let slope_threshold = (edge_min / 2).max(range / 4) as i16;

            let s = self.slope[i];
            let falling = s <= -slope_threshold && s <= self.slope[i - 1] && s < self.slope[i + 1];
            let rising = s >= slope_threshold && s >= self.slope[i - 1] && s > self.slope[i + 1];

            if falling && open_start.is_none() {
                open_start = Some(i as f32);
            } else if rising {
                if let Some(start) = open_start.take() {
                    let end = i as f32;
                    if end > start {
                        let scan_index = out.len();
                        out.push(MarkLocation {
                            scan_index,
                            start,
                            end,
                            normalized_start: start / norm,
                            normalized_end: end / norm,
                            matched_definition: None,
                        });
                    }
                }
            }
        }
    }

    fn fill_slope(&mut self) {
        let n = self.luma.len();
        self.slope.clear();
        self.slope.resize(n, 0);
        for i in SLOPE_HALF_WINDOW..n - SLOPE_HALF_WINDOW {
            self.slope[i] =
                self.luma[i + SLOPE_HALF_WINDOW] as i16 - self.luma[i - SLOPE_HALF_WINDOW] as i16;
        }
    }

    fn fill_rolling_range(&mut self) {
        let n = self.luma.len();
        self.range_lo.clear();
        self.range_lo.resize(n, 0);
        self.range_hi.clear();
        self.range_hi.resize(n, 0);
        for i in 0..n {
            let lo = i.saturating_sub(RANGE_HALF_WINDOW);
            let hi = (i + RANGE_HALF_WINDOW + 1).min(n);
            let mut min_v = u8::MAX;
            let mut max_v = u8::MIN;
            for &v in &self.luma[lo..hi] {
                min_v = min_v.min(v);
                max_v = max_v.max(v);
            }
            self.range_lo[i] = min_v;
            self.range_hi[i] = max_v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckscan_core::LumaImage;
    use nalgebra::Point2;

    /// Paint dark bars [start, end) on a light background row.
    fn bar_image(width: usize, bars: &[(usize, usize)], dark: u8, light: u8) -> LumaImage {
        let mut img = LumaImage::new_filled(width, 3, light);
        for &(s, e) in bars {
            for x in s..e {
                for y in 0..3 {
                    img.set(x, y, dark);
                }
            }
        }
        img
    }

    fn center_line(width: usize) -> SampleLine {
        SampleLine::new(Point2::new(0.0, 1.0), Point2::new(width as f32 - 1.0, 1.0))
            .expect("line")
    }

    #[test]
    fn detects_isolated_bars_in_order() {
        let img = bar_image(120, &[(20, 30), (50, 56), (90, 104)], 10, 240);
        let line = center_line(120);
        let mut det = MarkDetector::new();
        let mut marks = Vec::new();
        det.detect(&img.view(), &line, false, 24, &mut marks);

        assert_eq!(marks.len(), 3);
        let expected = [(20.0, 30.0), (50.0, 56.0), (90.0, 104.0)];
        for (mark, (s, e)) in marks.iter().zip(expected) {
            assert!((mark.start - s).abs() <= 2.0, "start {} vs {s}", mark.start);
            assert!((mark.end - e).abs() <= 2.0, "end {} vs {e}", mark.end);
        }
        assert_eq!(marks[0].scan_index, 0);
        assert_eq!(marks[2].scan_index, 2);
        assert!(marks[0].normalized_start < marks[0].normalized_end);
    }

    #[test]
    fn flat_line_detects_nothing() {
        let img = bar_image(80, &[], 0, 128);
        let line = center_line(80);
        let mut det = MarkDetector::new();
        let mut marks = Vec::new();
        det.detect(&img.view(), &line, false, 24, &mut marks);
        assert!(marks.is_empty());
    }

    #[test]
    fn low_contrast_bars_are_gated_out() {
        let img = bar_image(80, &[(30, 40)], 120, 128);
        let line = center_line(80);
        let mut det = MarkDetector::new();
        let mut marks = Vec::new();
        det.detect(&img.view(), &line, false, 24, &mut marks);
        assert!(marks.is_empty());
    }

    #[test]
    fn inverted_polarity_finds_light_bars() {
        // Light bar on dark background, detected with invert = true.
        let img = bar_image(80, &[(0, 80)], 240, 240);
        let mut img = img;
        for x in 30..40 {
            for y in 0..3 {
                img.set(x, y, 250);
            }
        }
        for x in 0..80 {
            for y in 0..3 {
                if !(30..40).contains(&x) {
                    img.set(x, y, 15);
                }
            }
        }
        let line = center_line(80);
        let mut det = MarkDetector::new();
        let mut marks = Vec::new();
        det.detect(&img.view(), &line, true, 24, &mut marks);
        assert_eq!(marks.len(), 1);
        assert!((marks[0].center() - 34.5).abs() <= 2.0);
    }
}
