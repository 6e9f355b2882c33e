//! Temporal fusion of recently resolved decks.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// History retention knobs (the `history*` option group).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryParams {
    pub max_entries: usize,
    pub max_age_ms: u64,
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            max_entries: 32,
            max_age_ms: 10_000,
        }
    }
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    indices: Vec<usize>,
    format_id: u32,
    at: Instant,
}

/// The winning resolved sequence among recent entries of one format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consensus {
    pub indices: Vec<usize>,
    /// Entries voting for the winning sequence.
    pub winner_count: usize,
    /// Entries voting for the strongest competing sequence.
    pub runner_up_count: usize,
    /// All entries considered (same format).
    pub total: usize,
}

impl Consensus {
    /// Winner support against its strongest competitor, in `[0, 1]`.
    pub fn confidence_factor(&self) -> f32 {
        let divisor = (self.winner_count + self.runner_up_count).max(1);
        self.winner_count as f32 / divisor as f32
    }
}

/// Bounded FIFO of recently resolved decks, newest first.
///
/// Owned by its [`ScanManager`](crate::ScanManager) rather than shared
/// globally, so independent scanners fuse independent histories.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    params: HistoryParams,
}

impl History {
    pub fn new(params: HistoryParams) -> Self {
        Self {
            entries: VecDeque::new(),
            params,
        }
    }

    pub fn set_params(&mut self, params: HistoryParams) {
        self.params = params;
        self.evict(Instant::now());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a resolved sequence at the head, evicting stale entries.
    pub fn add_entry(&mut self, indices: &[usize], format_id: u32) {
        self.add_entry_at(indices, format_id, Instant::now());
    }

    pub(crate) fn add_entry_at(&mut self, indices: &[usize], format_id: u32, now: Instant) {
        self.entries.push_front(HistoryEntry {
            indices: indices.to_vec(),
            format_id,
            at: now,
        });
        self.evict(now);
    }

    pub(crate) fn evict(&mut self, now: Instant) {
        while self.entries.len() > self.params.max_entries {
            self.entries.pop_back();
        }
        let max_age = Duration::from_millis(self.params.max_age_ms);
        while self
            .entries
            .back()
            .map(|e| now.duration_since(e.at) > max_age)
            .unwrap_or(false)
        {
            self.entries.pop_back();
        }
    }

    /// Entries recorded for `format_id`.
    pub fn total_for_format(&self, format_id: u32) -> usize {
        self.entries
            .iter()
            .filter(|e| e.format_id == format_id)
            .count()
    }

    /// Vote for the most common exact sequence among `format_id` entries.
    ///
    /// Ties go to the sequence seen most recently. Returns `None` when the
    /// history holds no entry for the format.
    pub fn consensus(&self, format_id: u32) -> Option<Consensus> {
        // Newest-first iteration makes "first seen" equal "most recent",
        // which is exactly the tie-break we want.
        let mut groups: Vec<(&[usize], usize)> = Vec::new();
        let mut total = 0;
        for entry in self.entries.iter().filter(|e| e.format_id == format_id) {
            total += 1;
            match groups.iter_mut().find(|(seq, _)| *seq == entry.indices) {
                Some((_, count)) => *count += 1,
                None => groups.push((entry.indices.as_slice(), 1)),
            }
        }
        if total == 0 {
            return None;
        }

        let (winner_pos, _) = groups
            .iter()
            .enumerate()
            .max_by(|&(ia, &(_, ca)), &(ib, &(_, cb))| ca.cmp(&cb).then(ib.cmp(&ia)))
            .expect("non-empty groups");
        let (winner_seq, winner_count) = groups[winner_pos];
        let runner_up_count = groups
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner_pos)
            .map(|(_, (_, c))| *c)
            .max()
            .unwrap_or(0);

        Some(Consensus {
            indices: winner_seq.to_vec(),
            winner_count,
            runner_up_count,
            total,
        })
    }
}
