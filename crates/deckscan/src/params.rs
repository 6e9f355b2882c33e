//! Composed scanner configuration.

use serde::{Deserialize, Serialize};

use deckscan_decode::DecodeParams;
use deckscan_search::SearchParams;

use crate::history::HistoryParams;

/// Analysis thresholds (the `analysis*` option group).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// History entries required before any confidence is reported.
    pub min_history_entries: usize,
    /// Below this confidence factor the result is withheld.
    pub minimum_confidence_factor_threshold: f32,
    /// At or above this confidence factor the report is high confidence.
    pub high_confidence_factor_threshold: f32,
    /// Report low-confidence successes instead of withholding them.
    pub enable_low_confidence_reports: bool,
    /// Minimum winner share of history entries for a consensus to exist.
    pub minimum_consensus: f32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            min_history_entries: 3,
            minimum_confidence_factor_threshold: 0.5,
            high_confidence_factor_threshold: 0.75,
            enable_low_confidence_reports: true,
            minimum_consensus: 0.5,
        }
    }
}

/// Everything one [`ScanManager`](crate::ScanManager) can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub search: SearchParams,
    pub decode: DecodeParams,
    pub history: HistoryParams,
    pub analysis: AnalysisParams,
    pub battery_saver: BatterySaverParams,
}

impl ScanParams {
    /// Parse a settings document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// After a long search drought, frames are only searched at a reduced rate
/// (the `searchBatterySaver*` option pair).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatterySaverParams {
    /// Drought length before the saver engages, in ms. 0 disables it.
    pub start_ms: u64,
    /// Minimum spacing between searches once engaged, in ms.
    pub interval_ms: u64,
}

impl Default for BatterySaverParams {
    fn default() -> Self {
        Self {
            start_ms: 10_000,
            interval_ms: 500,
        }
    }
}
