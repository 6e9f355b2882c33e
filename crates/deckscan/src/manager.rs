//! Per-frame orchestration: search, decode, resolve, analyze.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use deckscan_core::LumaImageView;
use deckscan_decode::{Deck, DeckResolver, DecodeFailureReason, DecodeResult, Decoder};
use deckscan_format::DeckFormat;
use deckscan_search::{DeckSearch, SearchResult};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::history::History;
use crate::params::ScanParams;
use crate::stats::ResultStats;

/// Why a frame produced no deck at all.
#[derive(Clone, Debug)]
pub enum FrameFailure {
    SearchNotFound,
    /// Deck located but too small to resolve its narrowest mark.
    SearchTooSmall,
    DecodeNotSharp,
    /// Decoded below the format's minimum card count; carries what was read.
    DecodeTooFewCards(Deck),
    DecodeFailed(DecodeFailureReason),
}

/// Per-frame verdict.
#[derive(Clone, Debug)]
pub enum AnalysisResult {
    Fail(FrameFailure),
    /// Decoded, but history holds no consensus ordering yet.
    Inconclusive { deck: Deck },
    /// Consensus exists but history is too thin to trust it.
    InsufficientHistory { deck: Deck },
    /// Consensus exists but its support is below the reporting threshold.
    InsufficientConfidence { deck: Deck, confidence: f32 },
    SuccessLowConfidence { deck: Deck, confidence: f32 },
    SuccessHighConfidence { deck: Deck, confidence: f32 },
}

impl AnalysisResult {
    /// The deck carried by this result, if any survived decoding.
    pub fn deck(&self) -> Option<&Deck> {
        match self {
            AnalysisResult::Fail(FrameFailure::DecodeTooFewCards(deck)) => Some(deck),
            AnalysisResult::Fail(_) => None,
            AnalysisResult::Inconclusive { deck }
            | AnalysisResult::InsufficientHistory { deck }
            | AnalysisResult::InsufficientConfidence { deck, .. }
            | AnalysisResult::SuccessLowConfidence { deck, .. }
            | AnalysisResult::SuccessHighConfidence { deck, .. } => Some(deck),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AnalysisResult::SuccessLowConfidence { .. }
                | AnalysisResult::SuccessHighConfidence { .. }
        )
    }

    #[inline]
    pub fn confidence(&self) -> Option<f32> {
        match self {
            AnalysisResult::InsufficientConfidence { confidence, .. }
            | AnalysisResult::SuccessLowConfidence { confidence, .. }
            | AnalysisResult::SuccessHighConfidence { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }
}

struct ScanState {
    params: ScanParams,
    search: DeckSearch,
    decoder: Decoder,
    resolver: DeckResolver,
    history: History,
    stats: ResultStats,
    last_found_at: Option<Instant>,
    last_search_at: Option<Instant>,
    started_at: Instant,
}

/// Frame orchestrator.
///
/// One mutex guards the whole per-frame pipeline: the frame source calls
/// [`process_frame`](Self::process_frame) sequentially, and collaborators
/// reconfigure between frames through
/// [`execute_when_not_processing`](Self::execute_when_not_processing).
pub struct ScanManager {
    state: Mutex<ScanState>,
}

impl ScanManager {
    pub fn new(params: ScanParams) -> Self {
        let history = History::new(params.history.clone());
        Self::with_history(params, history)
    }

    /// Build with an externally constructed history (its entries are kept).
    pub fn with_history(params: ScanParams, history: History) -> Self {
        Self {
            state: Mutex::new(ScanState {
                search: DeckSearch::new(params.search.clone()),
                decoder: Decoder::new(params.decode.clone()),
                resolver: DeckResolver::new(),
                history,
                stats: ResultStats::default(),
                last_found_at: None,
                last_search_at: None,
                started_at: Instant::now(),
                params,
            }),
        }
    }

    /// Run the full pipeline over one luma frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, format), fields(w = frame.width, h = frame.height, format = format.id()))
    )]
    pub fn process_frame(
        &self,
        frame: &LumaImageView<'_>,
        format: &DeckFormat,
    ) -> AnalysisResult {
        let mut state = self.state.lock().expect("scan state lock");
        state.process_frame(frame, format, Instant::now())
    }

    /// Clear cumulative stats, history and the remembered deck location.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("scan state lock");
        log::info!(
            "scan manager reset after {} frames ({} decoded)",
            state.stats.frames,
            state.stats.decode.decoded
        );
        state.stats = ResultStats::default();
        state.history.clear();
        state.search.reset();
        state.last_found_at = None;
        state.last_search_at = None;
        state.started_at = Instant::now();
    }

    /// Snapshot of the cumulative counters.
    pub fn stats(&self) -> ResultStats {
        self.state.lock().expect("scan state lock").stats
    }

    /// Current parameters.
    pub fn params(&self) -> ScanParams {
        self.state.lock().expect("scan state lock").params.clone()
    }

    /// Run `f` against the configuration while no frame is processing; the
    /// (possibly modified) parameters are re-applied afterwards.
    pub fn execute_when_not_processing<R>(&self, f: impl FnOnce(&mut ScanParams) -> R) -> R {
        let mut state = self.state.lock().expect("scan state lock");
        let r = f(&mut state.params);
        let params = state.params.clone();
        state.search.set_params(params.search);
        state.decoder.set_params(params.decode);
        state.history.set_params(params.history);
        r
    }
}

impl ScanState {
    fn process_frame(
        &mut self,
        frame: &LumaImageView<'_>,
        format: &DeckFormat,
        now: Instant,
    ) -> AnalysisResult {
        self.stats.frames += 1;

        if self.battery_saver_skips(now) {
            log::trace!("battery saver engaged, skipping search this frame");
            self.stats.search.not_found += 1;
            return AnalysisResult::Fail(FrameFailure::SearchNotFound);
        }
        self.last_search_at = Some(now);

        let mark_lines = match self.search.search(frame, format) {
            SearchResult::NotFound => {
                self.stats.search.not_found += 1;
                return AnalysisResult::Fail(FrameFailure::SearchNotFound);
            }
            SearchResult::TooSmall => {
                self.stats.search.too_small += 1;
                return AnalysisResult::Fail(FrameFailure::SearchTooSmall);
            }
            SearchResult::Decodable(mark_lines) => mark_lines,
        };
        self.stats.search.found += 1;
        self.last_found_at = Some(now);

        let deck = match self.decoder.decode(&mark_lines, format, &mut self.resolver) {
            DecodeResult::GeneralFailure(reason) => {
                self.stats.decode.failed += 1;
                return AnalysisResult::Fail(FrameFailure::DecodeFailed(reason));
            }
            DecodeResult::NotSharp => {
                self.stats.decode.not_sharp += 1;
                return AnalysisResult::Fail(FrameFailure::DecodeNotSharp);
            }
            DecodeResult::TooFewCards(deck) => {
                self.stats.decode.too_few_cards += 1;
                self.validate(&deck, format, None);
                return AnalysisResult::Fail(FrameFailure::DecodeTooFewCards(deck));
            }
            DecodeResult::Decoded(deck) => deck,
        };
        self.stats.decode.decoded += 1;

        self.history
            .add_entry_at(deck.resolved_indices(), format.id(), now);
        let result = self.analyze(deck, format);

        if let Some(deck) = result.deck() {
            let report = match &result {
                AnalysisResult::SuccessLowConfidence { .. } => Some(false),
                AnalysisResult::SuccessHighConfidence { .. } => Some(true),
                _ => None,
            };
            self.validate(deck, format, report);
        }
        result
    }

    /// Fuse the frame's deck with history into the final verdict.
    fn analyze(&mut self, mut deck: Deck, format: &DeckFormat) -> AnalysisResult {
        let analysis = &self.params.analysis;

        let Some(consensus) = self.history.consensus(format.id()) else {
            self.stats.analyzer.inconclusive += 1;
            return AnalysisResult::Inconclusive { deck };
        };
        let share = consensus.winner_count as f32 / consensus.total.max(1) as f32;
        if share < analysis.minimum_consensus {
            self.stats.analyzer.inconclusive += 1;
            return AnalysisResult::Inconclusive { deck };
        }

        if consensus.indices != deck.resolved_indices() {
            deck.replace_indices(consensus.indices.clone());
        }

        if consensus.total < analysis.min_history_entries {
            self.stats.analyzer.insufficient_history += 1;
            return AnalysisResult::InsufficientHistory { deck };
        }

        let confidence = consensus.confidence_factor();
        if confidence < analysis.minimum_confidence_factor_threshold {
            self.stats.analyzer.insufficient_confidence += 1;
            return AnalysisResult::InsufficientConfidence { deck, confidence };
        }
        if confidence < analysis.high_confidence_factor_threshold {
            if analysis.enable_low_confidence_reports {
                self.stats.analyzer.report_low_confidence += 1;
                return AnalysisResult::SuccessLowConfidence { deck, confidence };
            }
            self.stats.analyzer.insufficient_confidence += 1;
            return AnalysisResult::InsufficientConfidence { deck, confidence };
        }
        self.stats.analyzer.report_high_confidence += 1;
        AnalysisResult::SuccessHighConfidence { deck, confidence }
    }

    /// Check a deck against the format's physical test-deck order, if any.
    ///
    /// `report` is `Some(high)` when the deck was reported as a success.
    fn validate(&mut self, deck: &Deck, format: &DeckFormat, report: Option<bool>) {
        let expected = format.test_deck_order();
        if expected.is_empty() {
            return;
        }
        let got = deck.resolved_indices();

        if got == expected {
            self.stats.validation.correct += 1;
            match report {
                Some(true) => self.stats.validation.report_correct_high += 1,
                Some(false) => self.stats.validation.report_correct_low += 1,
                None => {}
            }
            return;
        }

        if is_subsequence(got, expected) {
            self.stats.validation.missing_cards += 1;
        } else if same_multiset(got, expected) {
            self.stats.validation.out_of_order += 1;
        } else {
            self.stats.validation.incorrect += 1;
        }
        if report.is_some() {
            self.stats.validation.report_incorrect += 1;
        }
    }

    /// True when the saver is engaged and this frame falls between searches.
    fn battery_saver_skips(&self, now: Instant) -> bool {
        let saver = &self.params.battery_saver;
        if saver.start_ms == 0 {
            return false;
        }
        let drought_since = self.last_found_at.unwrap_or(self.started_at);
        if now.duration_since(drought_since) < Duration::from_millis(saver.start_ms) {
            return false;
        }
        match self.last_search_at {
            Some(last) => now.duration_since(last) < Duration::from_millis(saver.interval_ms),
            None => false,
        }
    }
}

fn is_subsequence(needle: &[usize], haystack: &[usize]) -> bool {
    if needle.len() >= haystack.len() {
        return false;
    }
    let mut it = haystack.iter();
    needle.iter().all(|n| it.any(|h| h == n))
}

fn same_multiset(a: &[usize], b: &[usize]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsequence_and_multiset_helpers() {
        assert!(is_subsequence(&[1, 3], &[1, 2, 3]));
        assert!(!is_subsequence(&[3, 1], &[1, 2, 3]));
        assert!(!is_subsequence(&[1, 2, 3], &[1, 2, 3]));
        assert!(same_multiset(&[3, 1, 2], &[1, 2, 3]));
        assert!(!same_multiset(&[1, 1, 2], &[1, 2, 3]));
    }
}
