//! Deck resolution: reversible merge, strong-majority elimination
//! ("genocide") and adjacent-duplicate removal ("revenge").

use deckscan_format::DeckFormat;

use crate::card::ChallengeOutcome;
use crate::deck::{Deck, DeckResolver};

impl DeckResolver {
    /// Reduce the scan matrix to one ordered card sequence.
    ///
    /// After this returns, no card index appears twice and no two adjacent
    /// resolved entries are equal. The matrices remain populated with the
    /// survivors until the next `start_session`.
    pub fn resolve(&mut self, format: &DeckFormat) -> Deck {
        if format.is_reversible() {
            self.merge_reversed(format);
        }
        self.apply_genocide();
        let duplicates = self.pivot_by_row();
        if duplicates > 0 {
            self.apply_revenge();
        }
        self.emit(format)
    }

    /// Step 0: a reversible card read in both orientations is one physical
    /// card; keep only the better-supported orientation (ties keep forward).
    fn merge_reversed(&mut self, format: &DeckFormat) {
        let max = format.max_card_count();
        for c in 0..max {
            let forward: u32 = self.by_index[c].iter().map(|o| o.count).sum();
            let reversed: u32 = self.by_index[c + max].iter().map(|o| o.count).sum();
            if forward == 0 || reversed == 0 {
                continue;
            }
            if reversed > forward {
                self.by_index[c].clear();
            } else {
                self.by_index[c + max].clear();
            }
        }
    }

    /// Step 1: within each card index, a decisively stronger occurrence
    /// eliminates the others. Ambiguous contests are left for revenge.
    fn apply_genocide(&mut self) {
        for occurrences in &mut self.by_index {
            if occurrences.len() < 2 {
                continue;
            }
            let champion = occurrences
                .iter()
                .enumerate()
                .max_by_key(|&(i, o)| (o.count, std::cmp::Reverse(i)))
                .map(|(i, _)| i)
                .expect("non-empty occurrence list");
            let champ = occurrences[champion];
            let mut k = 0;
            occurrences.retain(|o| {
                let keep = if k == champion {
                    true
                } else {
                    champ.challenge(o) != ChallengeOutcome::StrongWin
                };
                k += 1;
                keep
            });
        }
    }

    /// Step 2a: pivot survivors into row order; returns how many card
    /// indices still hold more than one occurrence.
    fn pivot_by_row(&mut self) -> usize {
        for row in &mut self.by_row {
            row.clear();
        }
        let mut duplicates = 0;
        for occurrences in &self.by_index {
            if occurrences.len() > 1 {
                duplicates += 1;
            }
        }
        // Ascending card index keeps within-row entries ordered by index.
        let rows = self.rows;
        for occurrences in &self.by_index {
            for &o in occurrences {
                debug_assert!(o.row_index < rows);
                self.by_row[o.row_index].push(o);
            }
        }
        duplicates
    }

    /// Step 2b: walking rows in order, drop any occurrence whose card index
    /// equals the last emitted one.
    fn apply_revenge(&mut self) {
        let mut last: Option<usize> = None;
        for row in self.by_row.iter_mut().take(self.rows) {
            row.retain(|o| {
                if last == Some(o.card_index) {
                    false
                } else {
                    last = Some(o.card_index);
                    true
                }
            });
        }
    }

    /// Step 3: emit survivors in row-major, within-row-by-index order.
    fn emit(&self, format: &DeckFormat) -> Deck {
        let mut indices = Vec::new();
        let mut robustness = Vec::new();
        for row in self.by_row.iter().take(self.rows) {
            for o in row {
                indices.push(o.card_index);
                robustness.push(o.robustness);
            }
        }
        debug_assert!(
            indices.windows(2).all(|w| w[0] != w[1]),
            "resolved deck has adjacent duplicates"
        );
        Deck::new(format.id(), indices, robustness)
    }
}
