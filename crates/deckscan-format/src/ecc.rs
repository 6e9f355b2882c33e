//! Hamming-distance error correction over card-code words.

/// Hamming distance between two code words.
#[inline]
pub fn hamming(a: u16, b: u16) -> u32 {
    (a ^ b).count_ones()
}

/// Reverse the low `bits` bits of `code`.
#[inline]
pub fn bit_reverse(code: u16, bits: u32) -> u16 {
    code.reverse_bits() >> (16 - bits)
}

/// Pairwise minimum Hamming distance across `codes`.
///
/// Used for corpus validation at startup, not on the per-frame path.
pub fn min_code_distance(codes: &[u16]) -> u32 {
    let mut min = u32::MAX;
    for (i, &a) in codes.iter().enumerate() {
        for &b in &codes[i + 1..] {
            min = min.min(hamming(a, b));
        }
    }
    min
}

/// Precomputed error-correction tables over every `bits`-bit word.
///
/// `code[v]`/`index[v]` hold the unique real card code (and its index in the
/// build list) strictly nearest to `v` by Hamming distance, or `None` when
/// two real codes tie for nearest.
#[derive(Clone, Debug)]
pub struct EccTables {
    code: Vec<Option<u16>>,
    index: Vec<Option<u16>>,
}

impl EccTables {
    /// Build tables for `codes` over a `bits`-bit word space.
    ///
    /// `codes` must be unique; for reversible formats the caller passes the
    /// forward codes followed by the reversed codes so that indices above the
    /// forward count identify reversed cards.
    pub fn build(codes: &[u16], bits: u32) -> Self {
        let space = 1usize << bits;
        let mut code_table = vec![None; space];
        let mut index_table = vec![None; space];

        for v in 0..space {
            let v = v as u16;
            let mut best_dist = u32::MAX;
            let mut best: Option<(u16, u16)> = None;
            let mut tied = false;

            for (i, &c) in codes.iter().enumerate() {
                let d = hamming(v, c);
                if d < best_dist {
                    best_dist = d;
                    best = Some((c, i as u16));
                    tied = false;
                } else if d == best_dist && best.map(|(bc, _)| bc != c).unwrap_or(false) {
                    tied = true;
                }
            }

            if let Some((c, i)) = best {
                if !tied {
                    code_table[v as usize] = Some(c);
                    index_table[v as usize] = Some(i);
                }
            }
        }

        // A real code is strictly nearest to itself.
        for (i, &c) in codes.iter().enumerate() {
            debug_assert_eq!(code_table[c as usize], Some(c));
            debug_assert_eq!(index_table[c as usize], Some(i as u16));
        }

        Self {
            code: code_table,
            index: index_table,
        }
    }

    /// Corrected card code for an observed word, if unambiguous.
    #[inline]
    pub fn corrected_code(&self, word: u16) -> Option<u16> {
        self.code.get(word as usize).copied().flatten()
    }

    /// Card index for an observed word, if unambiguous.
    #[inline]
    pub fn corrected_index(&self, word: u16) -> Option<usize> {
        self.index
            .get(word as usize)
            .copied()
            .flatten()
            .map(usize::from)
    }

    /// Hamming distance from `word` to its corrected code, if any.
    #[inline]
    pub fn correction_distance(&self, word: u16) -> Option<u32> {
        self.corrected_code(word).map(|c| hamming(word, c))
    }
}
