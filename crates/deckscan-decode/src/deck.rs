//! The resolve matrices and the resolved deck they produce.

use crate::card::ScannedCard;

/// A resolved deck: the ordered card indices that survived resolution.
///
/// This is the lightweight output carried through analysis; the scan matrix
/// itself stays inside [`DeckResolver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    format_id: u32,
    resolved_indices: Vec<usize>,
    resolved_robustness: Vec<u8>,
}

impl Deck {
    pub fn new(format_id: u32, indices: Vec<usize>, robustness: Vec<u8>) -> Self {
        debug_assert_eq!(indices.len(), robustness.len());
        Self {
            format_id,
            resolved_indices: indices,
            resolved_robustness: robustness,
        }
    }

    #[inline]
    pub fn format_id(&self) -> u32 {
        self.format_id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resolved_indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resolved_indices.is_empty()
    }

    #[inline]
    pub fn resolved_indices(&self) -> &[usize] {
        &self.resolved_indices
    }

    #[inline]
    pub fn resolved_robustness(&self) -> &[u8] {
        &self.resolved_robustness
    }

    /// Replace the ordering with a history consensus, keeping the format id.
    pub fn replace_indices(&mut self, indices: Vec<usize>) {
        self.resolved_robustness = vec![0; indices.len()];
        self.resolved_indices = indices;
    }
}

/// Owner of the two transient resolve matrices.
///
/// The matrices are plain vectors whose capacity persists across frames;
/// `start_session` only clears them, growing when a larger format or taller
/// deck appears. Occurrence removal is real removal, so iteration never has
/// to skip tombstones.
#[derive(Debug, Default)]
pub struct DeckResolver {
    pub(crate) by_index: Vec<Vec<ScannedCard>>,
    pub(crate) by_row: Vec<Vec<ScannedCard>>,
    pub(crate) rows: usize,
}

impl DeckResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a resolve session for `max_indices` card indices over `rows`
    /// sample rows.
    pub fn start_session(&mut self, max_indices: usize, rows: usize) {
        if self.by_index.len() < max_indices {
            self.by_index.resize_with(max_indices, Vec::new);
        }
        if self.by_row.len() < rows {
            self.by_row.resize_with(rows, Vec::new);
        }
        for row in &mut self.by_index {
            row.clear();
        }
        for row in &mut self.by_row {
            row.clear();
        }
        self.rows = rows;
    }

    /// Insert one scanned occurrence, merging duplicates of the same
    /// `(card_index, row_index)`.
    pub fn add_card(&mut self, card: ScannedCard) {
        debug_assert!(card.card_index < self.by_index.len());
        debug_assert!(card.row_index < self.rows);
        let row = &mut self.by_index[card.card_index];
        if let Some(existing) = row
            .iter_mut()
            .find(|c| c.row_index == card.row_index)
        {
            existing.absorb(&card);
        } else {
            row.push(card);
        }
    }

    /// Number of distinct card indices currently holding occurrences.
    pub fn unique_index_count(&self) -> usize {
        self.by_index.iter().filter(|r| !r.is_empty()).count()
    }

    /// Occurrences recorded for `card_index` (test support).
    pub fn occurrences(&self, card_index: usize) -> &[ScannedCard] {
        self.by_index
            .get(card_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(index: usize, row: usize, count: u32) -> ScannedCard {
        ScannedCard {
            card_index: index,
            row_index: row,
            count,
            robustness: 100,
        }
    }

    #[test]
    fn add_card_merges_same_index_and_row() {
        let mut r = DeckResolver::new();
        r.start_session(8, 64);
        r.add_card(card(3, 10, 4));
        r.add_card(card(3, 10, 2));
        r.add_card(card(3, 20, 1));
        assert_eq!(r.occurrences(3).len(), 2);
        assert_eq!(r.occurrences(3)[0].count, 6);
        assert_eq!(r.unique_index_count(), 1);
    }

    #[test]
    fn session_reset_clears_but_keeps_capacity() {
        let mut r = DeckResolver::new();
        r.start_session(8, 64);
        r.add_card(card(1, 0, 3));
        let cap = r.by_index.capacity();
        r.start_session(4, 32);
        assert_eq!(r.unique_index_count(), 0);
        assert!(r.by_index.capacity() >= cap);
        // Smaller sessions do not shrink the matrices.
        assert!(r.by_index.len() >= 8);
    }
}
