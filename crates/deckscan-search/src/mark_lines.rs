//! Per-bit binarized sample columns spanning the deck's rows.

use nalgebra::Point2;

use deckscan_core::{sample_bilinear, LumaImageView};
use deckscan_format::CodeDefinition;

use crate::trace::TracedExtents;

/// Hard cap on traced/decoded deck height, in sample rows.
pub const MAX_SAMPLE_ROWS: usize = 4096;

/// A column's min/max span must reach this before its own levels are trusted
/// for binarization; flatter columns fall back to the traced references.
const MIN_COLUMN_SPAN: u8 = 16;

/// Fraction of rows dropped from each end of a column when measuring
/// sharpness (1/20 per end).
const SHARPNESS_TRIM_DIV: usize = 20;

/// One bit mark's column: raw luma per row, binarized bits, and the column's
/// peak sharpness (max gradient over amplitude).
#[derive(Clone, Debug)]
pub struct MarkLine {
    pub bit_index: usize,
    pub luma: Vec<u8>,
    pub bits: Vec<u8>,
    pub max_sharpness_unit_scalar: f32,
}

/// All bit columns for one successfully located deck, plus per-row anchors.
#[derive(Clone, Debug)]
pub struct MarkLines {
    pub rows: usize,
    pub lines: Vec<MarkLine>,
    /// Per-row deck center (midpoint of the outermost landmark polylines).
    pub anchors: Vec<Point2<f32>>,
    pub dark_reference: u8,
    pub light_reference: u8,
    /// Measured deck width in samples along the matched scan line.
    pub measured_width: f32,
}

impl MarkLines {
    /// Deck center at the mid row.
    pub fn center(&self) -> Point2<f32> {
        self.anchors[self.rows / 2]
    }
}

/// Build per-bit columns by interpolating between each bit's neighbor
/// landmark polylines and sampling the luma along the bit's midline.
///
/// `average_offset_multiplier` scales where inside the min/max span the
/// binarization threshold sits: `min + 0.5 * mult * span`.
pub fn build_mark_lines(
    img: &LumaImageView<'_>,
    code: &CodeDefinition,
    extents: &TracedExtents,
    measured_width: f32,
    invert: bool,
    average_offset_multiplier: f32,
) -> MarkLines {
    let rows = extents.rows;
    let mut lines = Vec::with_capacity(code.bit_marks().len());

    for (bit_pos, (&bit_mark, &(left_def, right_def))) in code
        .bit_marks()
        .iter()
        .zip(code.bit_neighbors())
        .enumerate()
    {
        let bit_center = code.marks()[bit_mark].normalized_center();
        let left_center = code.marks()[left_def].normalized_center();
        let right_center = code.marks()[right_def].normalized_center();
        let ratio = (bit_center - left_center) / (right_center - left_center);

        let left_line = polyline(extents, left_def);
        let right_line = polyline(extents, right_def);

        let mut luma = Vec::with_capacity(rows);
        for row in 0..rows {
            let l = left_line[row];
            let r = right_line[row];
            let p = Point2::new(l.x + (r.x - l.x) * ratio, l.y + (r.y - l.y) * ratio);
            let v = sample_bilinear(img, p.x, p.y).clamp(0.0, 255.0) as u8;
            luma.push(if invert { 255 - v } else { v });
        }

        let (bits, max_sharpness) = binarize_column(
            &luma,
            extents.dark_reference,
            extents.light_reference,
            average_offset_multiplier,
        );

        lines.push(MarkLine {
            bit_index: bit_pos,
            luma,
            bits,
            max_sharpness_unit_scalar: max_sharpness,
        });
    }

    let first = polyline(extents, *extents.landmark_defs.first().expect("landmarks"));
    let last = polyline(extents, *extents.landmark_defs.last().expect("landmarks"));
    let anchors = (0..rows)
        .map(|row| nalgebra::center(&first[row], &last[row]))
        .collect();

    MarkLines {
        rows,
        lines,
        anchors,
        dark_reference: extents.dark_reference,
        light_reference: extents.light_reference,
        measured_width,
    }
}

fn polyline<'a>(extents: &'a TracedExtents, def: usize) -> &'a [Point2<f32>] {
    let slot = extents
        .landmark_defs
        .iter()
        .position(|&d| d == def)
        .expect("bit neighbors are traced landmarks");
    &extents.polylines[slot]
}

/// Binarize one luma column (dark = 1) and measure its sharpness.
///
/// Columns whose own amplitude is too small to trust (a bit that never
/// changes across the deck) are classified against the traced dark/light
/// references instead, and report zero sharpness.
fn binarize_column(
    luma: &[u8],
    dark_reference: u8,
    light_reference: u8,
    average_offset_multiplier: f32,
) -> (Vec<u8>, f32) {
    let mut min_v = u8::MAX;
    let mut max_v = u8::MIN;
    for &v in luma {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    let span = max_v.saturating_sub(min_v);

    let threshold = if span >= MIN_COLUMN_SPAN {
        let t = min_v as f32 + 0.5 * average_offset_multiplier * span as f32;
        t.clamp(0.0, 255.0) as u8
    } else {
        ((dark_reference as u16 + light_reference as u16) / 2) as u8
    };

    let bits = luma.iter().map(|&v| u8::from(v < threshold)).collect();

    let max_sharpness = if span >= MIN_COLUMN_SPAN && luma.len() >= 4 {
        let trim = luma.len() / SHARPNESS_TRIM_DIV;
        let useful = &luma[trim..luma.len() - trim];
        let mut max_grad = 0u8;
        for pair in useful.windows(2) {
            max_grad = max_grad.max(pair[0].abs_diff(pair[1]));
        }
        max_grad as f32 / span as f32
    } else {
        0.0
    };

    (bits, max_sharpness)
}
