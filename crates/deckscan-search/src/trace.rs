//! Perpendicular landmark tracing: from one matched scan line to the deck's
//! full vertical extents.

use nalgebra::{Point2, Vector2};

use deckscan_core::{perpendicular, sample_bilinear, LumaImageView, SampleLine};
use deckscan_format::CodeDefinition;

use crate::mark_detect::MarkLocation;
use crate::mark_lines::MAX_SAMPLE_ROWS;
use crate::matcher::DeckMatch;

/// Per-landmark center polylines spanning the deck's traced rows.
///
/// Rows are ordered along the scan line's perpendicular; `scan_row` is the
/// index of the row the original match was found on.
#[derive(Clone, Debug)]
pub struct TracedExtents {
    pub rows: usize,
    pub scan_row: usize,
    /// Landmark definition mark indices, layout order; one polyline each.
    pub landmark_defs: Vec<usize>,
    /// `polylines[landmark][row]` center points in image space.
    pub polylines: Vec<Vec<Point2<f32>>>,
    /// Mean landmark-core luma at the matched row (polarity corrected).
    pub dark_reference: u8,
    /// Mean local background luma at the matched row (polarity corrected).
    pub light_reference: u8,
}

struct LandmarkTracer {
    def: usize,
    half_window: i32,
    /// Maximum refined-center drift per row, in pixels.
    max_drift: f32,
}

/// Trace every matched landmark perpendicular to `line`, in both directions,
/// until a landmark is lost, drifts past its gap bound, leaves the image, or
/// the row budget is exhausted.
///
/// Returns `None` when fewer than two rows trace (nothing to decode).
#[allow(clippy::too_many_arguments)]
pub fn trace_extents(
    img: &LumaImageView<'_>,
    line: &SampleLine,
    code: &CodeDefinition,
    deck_match: &DeckMatch,
    marks: &[MarkLocation],
    expected_height_rows: usize,
    edge_minimum_threshold: u8,
    invert: bool,
) -> Option<TracedExtents> {
    let dir = line.direction();
    let perp = perpendicular(dir);
    let max_rows = expected_height_rows.clamp(2, MAX_SAMPLE_ROWS);

    let mut tracers = Vec::with_capacity(deck_match.landmarks.len());
    let mut seeds = Vec::with_capacity(deck_match.landmarks.len());
    for &(def, m) in &deck_match.landmarks {
        let width_px = marks[m].width().max(1.0);
        let gap_px = code.marks()[def].landmark_min_gap_ratio * width_px;
        tracers.push(LandmarkTracer {
            def,
            // Window must fit the fixed refine buffer.
            half_window: ((0.5 * width_px + gap_px + 1.0).ceil() as i32).min(63),
            max_drift: gap_px.max(1.0),
        });
        seeds.push(line.point_at(marks[m].center()));
    }

    // Re-center the seeds and capture the luma references.
    let mut dark_sum = 0u32;
    let mut light_sum = 0u32;
    let mut seed_row = Vec::with_capacity(tracers.len());
    for (tracer, &seed) in tracers.iter().zip(&seeds) {
        let r = refine_center(img, seed, dir, tracer, edge_minimum_threshold, invert)?;
        dark_sum += r.window_min as u32;
        light_sum += r.window_max as u32;
        seed_row.push(r.center);
    }
    let n = tracers.len() as u32;

    let trace_dir = |step: Vector2<f32>, budget: usize| -> Vec<Vec<Point2<f32>>> {
        let mut rows = Vec::new();
        let mut current = seed_row.clone();
        'rows: while rows.len() < budget {
            let mut next = Vec::with_capacity(current.len());
            for (tracer, &prev) in tracers.iter().zip(&current) {
                let predicted = prev + step;
                match refine_center(img, predicted, dir, tracer, edge_minimum_threshold, invert) {
                    Some(r) => next.push(r.center),
                    None => break 'rows,
                }
            }
            rows.push(next.clone());
            current = next;
        }
        rows
    };

    let budget = max_rows - 1;
    let before = trace_dir(-perp, budget);
    let after = trace_dir(perp, budget.saturating_sub(before.len()));

    let rows = before.len() + 1 + after.len();
    if rows < 2 {
        return None;
    }

    // Stitch per-row point lists into per-landmark polylines, rows ordered
    // along +perp.
    let mut polylines = vec![Vec::with_capacity(rows); tracers.len()];
    for row in before.iter().rev() {
        for (k, &p) in row.iter().enumerate() {
            polylines[k].push(p);
        }
    }
    for (k, &p) in seed_row.iter().enumerate() {
        polylines[k].push(p);
    }
    for row in &after {
        for (k, &p) in row.iter().enumerate() {
            polylines[k].push(p);
        }
    }

    log::trace!(
        "traced {} rows ({} before scan line, {} after)",
        rows,
        before.len(),
        after.len()
    );

    Some(TracedExtents {
        rows,
        scan_row: before.len(),
        landmark_defs: tracers.iter().map(|t| t.def).collect(),
        polylines,
        dark_reference: (dark_sum / n) as u8,
        light_reference: (light_sum / n) as u8,
    })
}

struct Refined {
    center: Point2<f32>,
    window_min: u8,
    window_max: u8,
}

/// Re-locate a landmark center by scanning a short window along the mark
/// direction and taking the dark run nearest the prediction.
fn refine_center(
    img: &LumaImageView<'_>,
    predicted: Point2<f32>,
    dir: Vector2<f32>,
    tracer: &LandmarkTracer,
    edge_minimum_threshold: u8,
    invert: bool,
) -> Option<Refined> {
    let hw = tracer.half_window;
    let mut window = [0u8; 129];
    let len = (2 * hw + 1) as usize;
    debug_assert!(len <= window.len());

    let mut min_v = u8::MAX;
    let mut max_v = u8::MIN;
    for (slot, t) in (-hw..=hw).enumerate() {
        let p = predicted + dir * t as f32;
        let v = sample_bilinear(img, p.x, p.y).clamp(0.0, 255.0) as u8;
        let v = if invert { 255 - v } else { v };
        window[slot] = v;
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if max_v.saturating_sub(min_v) < edge_minimum_threshold {
        return None;
    }
    let threshold = ((min_v as u16 + max_v as u16) / 2) as u8;

    // Dark run whose center is nearest the predicted center.
    let mut best: Option<(f32, f32)> = None; // (|offset|, offset)
    let mut run_start: Option<usize> = None;
    for slot in 0..=len {
        let dark = slot < len && window[slot] < threshold;
        match (dark, run_start) {
            (true, None) => run_start = Some(slot),
            (false, Some(s)) => {
                let center = 0.5 * ((s + slot - 1) as f32) - hw as f32;
                if best.map(|(d, _)| center.abs() < d).unwrap_or(true) {
                    best = Some((center.abs(), center));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    let (drift, offset) = best?;
    if drift > tracer.max_drift {
        return None;
    }

    Some(Refined {
        center: predicted + dir * offset,
        window_min: min_v,
        window_max: max_v,
    })
}
