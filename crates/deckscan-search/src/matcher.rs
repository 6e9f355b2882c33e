//! Matching detected marks against a code layout.

use deckscan_format::CodeDefinition;

use crate::mark_detect::MarkLocation;

/// A successful landmark assignment for one candidate deck placement.
#[derive(Clone, Debug)]
pub struct DeckMatch {
    /// `(definition mark index, detected mark index)` pairs, one per
    /// landmark, in layout order.
    pub landmarks: Vec<(usize, usize)>,
    /// RMSD of normalized landmark edge positions vs the layout, x100.
    pub error: f32,
    /// Sample-space leading edge of the first matched landmark.
    pub span_start: f32,
    /// Sample-space trailing edge of the last matched landmark.
    pub span_end: f32,
}

impl DeckMatch {
    /// Measured deck width in samples along the scan line.
    #[inline]
    pub fn span(&self) -> f32 {
        self.span_end - self.span_start
    }
}

/// Match `marks` (scan order) against the landmark layout of `code`.
///
/// Every `(first start landmark, first end landmark)` window over the
/// detected marks is scored: start and end landmark runs bind consecutively,
/// interior landmarks bind to the unused candidate nearest their normalized
/// center. The window with the smallest edge RMSD wins, provided it beats
/// `max_error`.
pub fn match_code(
    code: &CodeDefinition,
    marks: &[MarkLocation],
    max_error: f32,
) -> Option<DeckMatch> {
    let start_defs = code.start_landmarks();
    let interior_defs = code.interior_landmarks();
    let end_defs = code.end_landmarks();
    let s = start_defs.len();
    let e = end_defs.len();
    let i_count = interior_defs.len();
    let needed = s + e + i_count;
    if marks.len() < needed || s == 0 || e == 0 {
        return None;
    }

    let mut best: Option<DeckMatch> = None;

    for a in 0..=marks.len() - needed {
        // End landmark run must leave room for interiors in between.
        for b in (a + s + i_count)..=marks.len() - e {
            let span_start = marks[a].start;
            let span_end = marks[b + e - 1].end;
            let span = span_end - span_start;
            if span <= 0.0 {
                continue;
            }

            let candidate = assign_landmarks(
                code, marks, a, b, span_start, span,
            );
            let Some(candidate) = candidate else {
                continue;
            };

            if candidate.error < max_error
                && best
                    .as_ref()
                    .map(|p| candidate.error < p.error)
                    .unwrap_or(true)
            {
                best = Some(candidate);
            }
        }
    }

    best
}

fn assign_landmarks(
    code: &CodeDefinition,
    marks: &[MarkLocation],
    a: usize,
    b: usize,
    span_start: f32,
    span: f32,
) -> Option<DeckMatch> {
    let start_defs = code.start_landmarks();
    let interior_defs = code.interior_landmarks();
    let end_defs = code.end_landmarks();
    let s = start_defs.len();
    let e = end_defs.len();

    let norm = |x: f32| (x - span_start) / span;

    let mut assignments: Vec<(usize, usize)> =
        Vec::with_capacity(s + interior_defs.len() + e);

    for (k, &def) in start_defs.iter().enumerate() {
        assignments.push((def, a + k));
    }

    // Interior landmarks: nearest unused candidate between the runs,
    // ties broken by scan order.
    let mut used = vec![false; marks.len()];
    for (_, m) in &assignments {
        used[*m] = true;
    }
    for &def in interior_defs {
        let target = code.marks()[def].normalized_center();
        let mut chosen: Option<(usize, f32)> = None;
        for m in (a + s)..b {
            if used[m] {
                continue;
            }
            let d = (norm(marks[m].center()) - target).abs();
            if chosen.map(|(_, bd)| d < bd).unwrap_or(true) {
                chosen = Some((m, d));
            }
        }
        let (m, _) = chosen?;
        used[m] = true;
        assignments.push((def, m));
    }

    for (k, &def) in end_defs.iter().enumerate() {
        assignments.push((def, b + k));
    }

    // Edge RMSD over every assigned landmark, x100.
    let mut sum_sq = 0.0f64;
    for &(def, m) in &assignments {
        let d = &code.marks()[def];
        let ds = norm(marks[m].start) - d.normalized_start;
        let de = norm(marks[m].end) - d.normalized_end();
        sum_sq += (ds * ds + de * de) as f64;
    }
    let error = ((sum_sq / (assignments.len() * 2) as f64).sqrt() * 100.0) as f32;

    Some(DeckMatch {
        landmarks: assignments,
        error,
        span_start,
        span_end: span_start + span,
    })
}
