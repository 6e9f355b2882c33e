//! Sub-pixel line walker producing fixed-length luma sample runs.

use nalgebra::{Point2, Vector2};

use crate::image::{sample_bilinear_u8, LumaImageView};

const FP_SHIFT: u32 = 16;
const FP_ONE: i64 = 1 << FP_SHIFT;

#[inline]
fn to_fp(v: f32) -> i64 {
    (v as f64 * FP_ONE as f64).round() as i64
}

#[inline]
fn from_fp(v: i64) -> f32 {
    (v as f64 / FP_ONE as f64) as f32
}

/// An image-space line prepared for dense sub-pixel sampling.
///
/// The interpolation step is precomputed in 16.16 fixed point so that walking
/// the line is a pair of integer additions per sample.
#[derive(Clone, Debug)]
pub struct SampleLine {
    start: Point2<f32>,
    end: Point2<f32>,
    start_fp: (i64, i64),
    step_fp: (i64, i64),
    sample_count: usize,
}

impl SampleLine {
    /// Build a line from `start` to `end`; one sample per pixel of length.
    ///
    /// Returns `None` for degenerate (shorter than one pixel) lines.
    pub fn new(start: Point2<f32>, end: Point2<f32>) -> Option<Self> {
        let v = end - start;
        let len = v.norm();
        if !len.is_finite() || len < 1.0 {
            return None;
        }
        let sample_count = len.floor() as usize + 1;
        let denom = (sample_count - 1).max(1) as f32;
        let step = v / denom;
        Some(Self {
            start,
            end,
            start_fp: (to_fp(start.x), to_fp(start.y)),
            step_fp: (to_fp(step.x), to_fp(step.y)),
            sample_count,
        })
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn start(&self) -> Point2<f32> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Point2<f32> {
        self.end
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        nalgebra::center(&self.start, &self.end)
    }

    /// Full start-to-end displacement.
    #[inline]
    pub fn vector(&self) -> Vector2<f32> {
        self.end - self.start
    }

    /// Unit direction of the walk.
    #[inline]
    pub fn direction(&self) -> Vector2<f32> {
        self.vector().normalize()
    }

    /// Position at fractional sample offset `s` (extrapolates beyond the
    /// endpoints).
    #[inline]
    pub fn point_at(&self, s: f32) -> Point2<f32> {
        Point2::new(
            from_fp(self.start_fp.0) + s * from_fp(self.step_fp.0),
            from_fp(self.start_fp.1) + s * from_fp(self.step_fp.1),
        )
    }

    /// Sub-pixel position of sample `i`.
    #[inline]
    pub fn point(&self, i: usize) -> Point2<f32> {
        debug_assert!(i < self.sample_count);
        let i = i as i64;
        Point2::new(
            from_fp(self.start_fp.0 + i * self.step_fp.0),
            from_fp(self.start_fp.1 + i * self.step_fp.1),
        )
    }

    /// Bilinear luma at sample `i`.
    #[inline]
    pub fn sample(&self, img: &LumaImageView<'_>, i: usize) -> u8 {
        let p = self.point(i);
        sample_bilinear_u8(img, p.x, p.y)
    }

    /// Fill `out` with all samples along the line.
    ///
    /// `out` is cleared first; its capacity is reused across calls.
    pub fn fill_samples(&self, img: &LumaImageView<'_>, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.sample_count);
        let (mut x, mut y) = self.start_fp;
        for _ in 0..self.sample_count {
            out.push(sample_bilinear_u8(img, from_fp(x), from_fp(y)));
            x += self.step_fp.0;
            y += self.step_fp.1;
        }
    }
}
