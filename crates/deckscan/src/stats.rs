//! Cumulative per-manager outcome counters.

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub found: u64,
    pub not_found: u64,
    pub too_small: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub decoded: u64,
    pub not_sharp: u64,
    pub too_few_cards: u64,
    pub failed: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyzerStats {
    pub failed: u64,
    pub inconclusive: u64,
    pub insufficient_history: u64,
    pub insufficient_confidence: u64,
    pub report_low_confidence: u64,
    pub report_high_confidence: u64,
}

/// Counters comparing scans against a format's known test-deck order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub correct: u64,
    pub incorrect: u64,
    pub missing_cards: u64,
    pub out_of_order: u64,
    pub report_incorrect: u64,
    pub report_correct_low: u64,
    pub report_correct_high: u64,
}

/// Everything the manager has counted since construction or [`reset`].
///
/// [`reset`]: crate::ScanManager::reset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResultStats {
    pub frames: u64,
    pub search: SearchStats,
    pub decode: DecodeStats,
    pub analyzer: AnalyzerStats,
    pub validation: ValidationStats,
}
