//! Search configuration.

use serde::{Deserialize, Serialize};

/// Tunables for scan-line generation, mark detection and deck matching.
///
/// Field names mirror the flat configuration surface of the embedding
/// application (the `searchLine*` / `search*` option group).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Weight multiplier applied to the angle term when prioritizing lines;
    /// larger values prefer horizontal lines for longer.
    pub line_horizontal_weight_adjustment: f32,
    /// Sigmoid slope for the angle distribution.
    pub line_rotation_density: f32,
    pub line_rotation_steps: usize,
    /// Angles below this (degrees) are skipped.
    pub line_min_angle_cutoff_degrees: f32,
    /// Angles above this (degrees) are skipped.
    pub line_max_angle_cutoff_degrees: f32,
    /// Offset range as a fraction of half the larger image dimension.
    pub line_linear_limit_scalar: f32,
    /// Exponent for the offset distribution.
    pub line_linear_density: f32,
    pub line_linear_steps: usize,
    /// Also scan each line rotated 180 degrees so asymmetric codes are found
    /// upside down. Ignored (off) for reversible formats, whose orientation
    /// is encoded in the cards themselves.
    pub line_bidirectional: bool,
    /// Maximum accepted deck match RMSD (normalized units x100).
    pub max_deck_match_error: f32,
    /// Minimum luma range before an edge is considered at all.
    pub edge_minimum_threshold: u8,
    /// Applied to a bit column's min/max span when choosing its
    /// binarization threshold: `threshold = min + 0.5 * mult * span`.
    pub mark_line_average_offset_multiplier: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            line_horizontal_weight_adjustment: 0.4,
            line_rotation_density: 4.0,
            line_rotation_steps: 16,
            line_min_angle_cutoff_degrees: 0.0,
            line_max_angle_cutoff_degrees: 75.0,
            line_linear_limit_scalar: 0.9,
            line_linear_density: 2.0,
            line_linear_steps: 32,
            line_bidirectional: true,
            max_deck_match_error: 2.5,
            edge_minimum_threshold: 24,
            mark_line_average_offset_multiplier: 1.0,
        }
    }
}
