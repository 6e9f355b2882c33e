//! Decode configuration.

use serde::{Deserialize, Serialize};

/// Tunables for word decoding and card grouping (the `decode*` /
/// `deckMinSamplesPerCard` option group).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Gate frames whose sharpest bit column is still too blurry.
    pub enable_sharpness_detection: bool,
    /// Minimum acceptable column sharpness (max gradient over amplitude).
    pub min_sharpness: f32,
    /// Runs shorter than this many rows are discarded as noise.
    pub min_samples_per_card: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            enable_sharpness_detection: true,
            min_sharpness: 0.25,
            min_samples_per_card: 2,
        }
    }
}
