//! Scanned card occurrences and the genocide challenge.

/// One maximal run of rows that decoded to the same card index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannedCard {
    /// Card index in `[0, max_card_count_with_reversed)`.
    pub card_index: usize,
    /// First row of the run.
    pub row_index: usize,
    /// Number of rows supporting this occurrence.
    pub count: u32,
    /// Best per-row decoding quality in the run, `0..=255`.
    pub robustness: u8,
}

/// Outcome of one occurrence (the challenger) challenging another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The challengee is stronger.
    ChallengeeWins,
    /// Equal support; nobody is eliminated.
    Tie,
    /// The challenger is ahead but not decisively.
    WeakWin,
    /// The challenger dominates; the challengee can be eliminated.
    StrongWin,
}

/// Count ratio at which a win becomes strong enough to eliminate the loser.
const STRONG_WIN_RATIO: u32 = 2;

impl ScannedCard {
    /// Challenge `other` for the right to represent this card index.
    pub fn challenge(&self, other: &ScannedCard) -> ChallengeOutcome {
        if other.count > self.count {
            return ChallengeOutcome::ChallengeeWins;
        }
        if other.count == self.count {
            return ChallengeOutcome::Tie;
        }
        if self.count >= STRONG_WIN_RATIO * other.count.max(1) {
            ChallengeOutcome::StrongWin
        } else {
            ChallengeOutcome::WeakWin
        }
    }

    /// Fold another observation of the same `(card_index, row_index)` in.
    pub fn absorb(&mut self, other: &ScannedCard) {
        debug_assert_eq!(self.card_index, other.card_index);
        debug_assert_eq!(self.row_index, other.row_index);
        self.count += other.count;
        self.robustness = self.robustness.max(other.robustness);
    }
}
