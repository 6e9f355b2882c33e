//! Prioritized candidate scan-line placements.

use nalgebra::Point2;

use deckscan_core::{angle_unit_vector, clip_segment, perpendicular, Rect, SampleLine};

use crate::params::SearchParams;

/// One candidate placement: perpendicular offset from the search origin plus
/// a rotation, with a precomputed priority weight (smaller scans earlier).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLineSpec {
    pub offset: f32,
    pub angle_degrees: f32,
    pub weight: f32,
}

/// The full prioritized list of scan-line placements for one image size,
/// parameter set and format orientation class.
#[derive(Clone, Debug)]
pub struct SearchLines {
    lines: Vec<SearchLineSpec>,
    params: SearchParams,
    image_width: usize,
    image_height: usize,
    reversible: bool,
}

/// Dedup thresholds: two lines closer than this are redundant.
const DEDUP_MAX_ANGLE_DELTA: f32 = 0.5;
const DEDUP_MAX_CENTER_DISTANCE: f32 = 10.0;

impl SearchLines {
    pub fn generate(
        params: &SearchParams,
        image_width: usize,
        image_height: usize,
        reversible: bool,
    ) -> Self {
        let range =
            0.5 * image_width.max(image_height) as f32 * params.line_linear_limit_scalar;
        let with_rotated = params.line_bidirectional && !reversible;

        let mut lines = Vec::new();
        for i in 0..params.line_linear_steps {
            let t = i as f32 / params.line_linear_steps as f32;
            let offset_scalar = t.powf(params.line_linear_density);
            let offset = offset_scalar * range;

            for j in 0..params.line_rotation_steps {
                let u = j as f32 / params.line_rotation_steps as f32;
                let angle_scalar = centered_sigmoid(u, params.line_rotation_density);
                let angle = angle_scalar * 90.0;
                if angle < params.line_min_angle_cutoff_degrees
                    || angle > params.line_max_angle_cutoff_degrees
                {
                    continue;
                }

                let weight = offset_scalar.abs()
                    + angle_scalar.abs() * params.line_horizontal_weight_adjustment;
                push_variants(&mut lines, offset, angle, weight, with_rotated);
            }
        }

        lines.sort_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.offset
                        .abs()
                        .partial_cmp(&b.offset.abs())
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(
                    a.angle_degrees
                        .rem_euclid(360.0)
                        .partial_cmp(&b.angle_degrees.rem_euclid(360.0))
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let center = Point2::new(image_width as f32 * 0.5, image_height as f32 * 0.5);
        dedup_nearby(&mut lines, center);

        log::debug!(
            "generated {} search lines for {}x{} (reversible={})",
            lines.len(),
            image_width,
            image_height,
            reversible
        );

        Self {
            lines,
            params: params.clone(),
            image_width,
            image_height,
            reversible,
        }
    }

    /// Whether the list must be regenerated for the given inputs.
    pub fn is_outdated(
        &self,
        params: &SearchParams,
        image_width: usize,
        image_height: usize,
        reversible: bool,
    ) -> bool {
        self.image_width != image_width
            || self.image_height != image_height
            || self.reversible != reversible
            || &self.params != params
    }

    #[inline]
    pub fn specs(&self) -> &[SearchLineSpec] {
        &self.lines
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Normalized sigmoid over `u in [0,1]`, centered on `[-1,1]` with slope `k`,
/// rescaled so 0 maps to 0 and 1 maps to 1 (0.5 maps to 0.5).
fn centered_sigmoid(u: f32, k: f32) -> f32 {
    if k.abs() < 1e-3 {
        return u;
    }
    let s = |x: f32| 1.0 / (1.0 + (-k * x).exp());
    let lo = s(-1.0);
    let hi = s(1.0);
    (s(2.0 * u - 1.0) - lo) / (hi - lo)
}

fn push_variants(
    out: &mut Vec<SearchLineSpec>,
    offset: f32,
    angle: f32,
    weight: f32,
    with_rotated: bool,
) {
    let mut push = |offset: f32, angle_degrees: f32| {
        out.push(SearchLineSpec {
            offset,
            angle_degrees,
            weight,
        });
        if with_rotated {
            out.push(SearchLineSpec {
                offset,
                angle_degrees: angle_degrees + 180.0,
                weight,
            });
        }
    };

    push(offset, angle);
    if offset != 0.0 {
        push(-offset, angle);
    }
    if angle != 0.0 {
        push(offset, -angle);
        if offset != 0.0 {
            push(-offset, -angle);
        }
    }
}

/// Drop later (heavier) lines nearly coincident with an earlier one.
fn dedup_nearby(lines: &mut Vec<SearchLineSpec>, origin: Point2<f32>) {
    let mut kept: Vec<SearchLineSpec> = Vec::with_capacity(lines.len());
    let anchor = |l: &SearchLineSpec| {
        let n = perpendicular(angle_unit_vector(l.angle_degrees));
        origin + n * l.offset
    };

    'next: for line in lines.iter() {
        let p = anchor(line);
        for prev in &kept {
            let da = (line.angle_degrees - prev.angle_degrees).rem_euclid(360.0);
            let da = da.min(360.0 - da);
            if da < DEDUP_MAX_ANGLE_DELTA && nalgebra::distance(&p, &anchor(prev)) < DEDUP_MAX_CENTER_DISTANCE {
                continue 'next;
            }
        }
        kept.push(*line);
    }
    *lines = kept;
}

/// Materialize one placement as a clipped [`SampleLine`].
///
/// The line runs through `origin + perpendicular(angle) * offset` along
/// `angle`, clipped to `rect`. Returns `None` when the clipped span is
/// degenerate.
pub fn materialize_line(
    origin: Point2<f32>,
    offset: f32,
    angle_degrees: f32,
    rect: &Rect,
) -> Option<SampleLine> {
    let dir = angle_unit_vector(angle_degrees);
    let n = perpendicular(dir);
    let p = origin + n * offset;
    let ext = rect.width + rect.height + offset.abs();
    let (a, b) = clip_segment(p - dir * ext, p + dir * ext, rect)?;
    SampleLine::new(a, b)
}
