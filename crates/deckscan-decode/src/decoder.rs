//! Per-row word assembly, error correction and card grouping.

use deckscan_format::DeckFormat;
use deckscan_search::MarkLines;

use crate::card::ScannedCard;
use crate::deck::{Deck, DeckResolver};
use crate::params::DecodeParams;

/// Why a decode could not even start.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeFailureReason {
    #[error("mark lines carry no rows")]
    EmptyMarkLines,
    #[error("{columns} bit columns do not fit a {bits}-bit format")]
    BitColumnMismatch { columns: usize, bits: u32 },
}

/// Outcome of decoding one located deck.
#[derive(Clone, Debug)]
pub enum DecodeResult {
    GeneralFailure(DecodeFailureReason),
    /// Sharpness gating rejected the frame as too blurry.
    NotSharp,
    /// Decoded, but fewer unique cards than the format requires.
    TooFewCards(Deck),
    Decoded(Deck),
}

impl DecodeResult {
    #[inline]
    pub fn deck(&self) -> Option<&Deck> {
        match self {
            DecodeResult::TooFewCards(deck) | DecodeResult::Decoded(deck) => Some(deck),
            _ => None,
        }
    }
}

/// Stateless word decoder; the caller owns the resolve matrices.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    params: DecodeParams,
}

impl Decoder {
    pub fn new(params: DecodeParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &DecodeParams {
        &self.params
    }

    pub fn set_params(&mut self, params: DecodeParams) {
        self.params = params;
    }

    /// Decode `mark_lines` into a resolved [`Deck`].
    ///
    /// Each row's bits assemble into a word, error correction maps words to
    /// card indices (ambiguous words drop their row), and maximal runs of
    /// the same index become [`ScannedCard`] occurrences fed to `resolver`.
    pub fn decode(
        &self,
        mark_lines: &MarkLines,
        format: &DeckFormat,
        resolver: &mut DeckResolver,
    ) -> DecodeResult {
        let rows = mark_lines.rows;
        if rows == 0 || mark_lines.lines.is_empty() {
            return DecodeResult::GeneralFailure(DecodeFailureReason::EmptyMarkLines);
        }
        let bits = format.bit_count();
        if mark_lines.lines.len() != bits as usize {
            return DecodeResult::GeneralFailure(DecodeFailureReason::BitColumnMismatch {
                columns: mark_lines.lines.len(),
                bits,
            });
        }

        if self.params.enable_sharpness_detection {
            let sharpest = mark_lines
                .lines
                .iter()
                .map(|l| l.max_sharpness_unit_scalar)
                .fold(0.0f32, f32::max);
            if sharpest < self.params.min_sharpness {
                log::debug!(
                    "sharpness {sharpest:.3} below minimum {:.3}",
                    self.params.min_sharpness
                );
                return DecodeResult::NotSharp;
            }
        }

        resolver.start_session(format.max_card_count_with_reversed(), rows);

        let ecc = format.ecc();
        let mut run: Option<ScannedCard> = None;

        for row in 0..rows {
            let mut word = 0u16;
            for (k, line) in mark_lines.lines.iter().enumerate() {
                word |= u16::from(line.bits[row]) << k;
            }

            let decoded = ecc.corrected_index(word).map(|index| {
                let distance = ecc.correction_distance(word).unwrap_or(0);
                let robustness = row_robustness(bits, distance);
                (index, robustness)
            });

            match (decoded, run.as_mut()) {
                (Some((index, robustness)), Some(current)) if current.card_index == index => {
                    current.count += 1;
                    current.robustness = current.robustness.max(robustness);
                }
                (decoded, _) => {
                    if let Some(finished) = run.take() {
                        self.flush_run(finished, resolver);
                    }
                    run = decoded.map(|(index, robustness)| ScannedCard {
                        card_index: index,
                        row_index: row,
                        count: 1,
                        robustness,
                    });
                }
            }
        }
        if let Some(finished) = run.take() {
            self.flush_run(finished, resolver);
        }

        let unique = resolver.unique_index_count();
        let deck = resolver.resolve(format);

        if unique < format.min_card_count() {
            log::debug!(
                "decoded only {unique} unique cards (minimum {})",
                format.min_card_count()
            );
            return DecodeResult::TooFewCards(deck);
        }
        DecodeResult::Decoded(deck)
    }

    fn flush_run(&self, card: ScannedCard, resolver: &mut DeckResolver) {
        if (card.count as usize) < self.params.min_samples_per_card {
            return;
        }
        resolver.add_card(card);
    }
}

/// Per-row quality from the correction distance: exact words score 255,
/// heavily corrected words approach 0.
#[inline]
fn row_robustness(bits: u32, distance: u32) -> u8 {
    let bits = bits.max(1);
    ((255 * (bits - distance.min(bits))) / bits) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckscan_format::{CodeKind, DeckFormat, FormatSpec, MarkSpec, MarkSpecKind};
    use deckscan_search::{MarkLine, MarkLines};
    use nalgebra::Point2;

    fn format(min_card_count: usize) -> DeckFormat {
        format_with_codes(
            min_card_count,
            vec![0b0001, 0b0010, 0b0100, 0b1000, 0b0111, 0b1011, 0b1101, 0b1110],
        )
    }

    fn format_with_codes(min_card_count: usize, codes: Vec<u16>) -> DeckFormat {
        let mut marks = vec![MarkSpec {
            kind: MarkSpecKind::Landmark,
            width_mm: 4.0,
        }];
        for i in 0..4 {
            marks.push(MarkSpec {
                kind: MarkSpecKind::Space,
                width_mm: if i == 0 { 3.0 } else { 2.0 },
            });
            marks.push(MarkSpec {
                kind: MarkSpecKind::Bit,
                width_mm: 2.0,
            });
        }
        marks.push(MarkSpec {
            kind: MarkSpecKind::Space,
            width_mm: 2.0,
        });
        marks.push(MarkSpec {
            kind: MarkSpecKind::Landmark,
            width_mm: 4.0,
        });

        DeckFormat::new(FormatSpec {
            id: 9,
            name: "decode-test".into(),
            description: String::new(),
            kind: CodeKind::Normal,
            invert_luma: false,
            ignored: false,
            physical_length_mm: 88.0,
            physical_width_mm: 26.0,
            printable_max_width_mm: 60.0,
            stack_height_52_mm: 15.6,
            compressed_stack_height_52_mm: 14.0,
            min_card_count,
            face_codes_ndo: (1..=codes.len()).map(|i| format!("C{i}")).collect(),
            card_codes_ndo: codes,
            face_codes_test_deck_order: Vec::new(),
            marks,
        })
        .expect("format")
    }

    /// Mark lines whose row words follow `words`, all columns fully sharp.
    fn synthetic_mark_lines(words: &[u16]) -> MarkLines {
        let rows = words.len();
        let lines = (0..4)
            .map(|k| {
                let bits: Vec<u8> = words.iter().map(|w| ((w >> k) & 1) as u8).collect();
                let luma: Vec<u8> = bits.iter().map(|&b| if b == 1 { 20 } else { 220 }).collect();
                MarkLine {
                    bit_index: k,
                    luma,
                    bits,
                    max_sharpness_unit_scalar: 1.0,
                }
            })
            .collect();
        MarkLines {
            rows,
            lines,
            anchors: vec![Point2::new(0.0, 0.0); rows],
            dark_reference: 20,
            light_reference: 220,
            measured_width: 100.0,
        }
    }

    #[test]
    fn decodes_grouped_runs_in_order() {
        let format = format(2);
        let decoder = Decoder::new(DecodeParams::default());
        let mut resolver = DeckResolver::new();

        // Three cards, four rows each.
        let mut words = Vec::new();
        for &code in &[0b0001u16, 0b0111, 0b1110] {
            words.extend(std::iter::repeat(code).take(4));
        }
        let result = decoder.decode(&synthetic_mark_lines(&words), &format, &mut resolver);
        let DecodeResult::Decoded(deck) = result else {
            panic!("expected Decoded, got {result:?}");
        };
        assert_eq!(deck.resolved_indices(), &[0, 4, 7]);
        assert_eq!(deck.resolved_robustness(), &[255, 255, 255]);
    }

    #[test]
    fn corrected_rows_join_their_run_with_reduced_robustness() {
        // Two maximally distant codes so a single flip corrects uniquely.
        let format = format_with_codes(1, vec![0b0001, 0b1110]);
        let decoder = Decoder::new(DecodeParams::default());
        let mut resolver = DeckResolver::new();

        // 0b0011 is one flip from 0b0001 and three from 0b1110.
        let words = [0b0001u16, 0b0011, 0b0001, 0b0001];
        let result = decoder.decode(&synthetic_mark_lines(&words), &format, &mut resolver);
        let DecodeResult::Decoded(deck) = result else {
            panic!("expected Decoded, got {result:?}");
        };
        assert_eq!(deck.resolved_indices(), &[0]);
        assert_eq!(deck.resolved_robustness(), &[255]);
        assert_eq!(resolver.occurrences(0)[0].count, 4);
    }

    #[test]
    fn ambiguous_words_split_runs_and_short_runs_drop() {
        let format = format(1);
        let decoder = Decoder::new(DecodeParams {
            min_samples_per_card: 2,
            ..DecodeParams::default()
        });
        let mut resolver = DeckResolver::new();

        // 0b0011 is equidistant between codes 0b0001/0b0010/0b0111/0b1011:
        // ambiguous, so the row drops and splits the run around it.
        let words = [0b0001u16, 0b0001, 0b0011, 0b0001, 0b0001, 0b0010];
        let result = decoder.decode(&synthetic_mark_lines(&words), &format, &mut resolver);
        let DecodeResult::Decoded(deck) = result else {
            panic!("expected Decoded, got {result:?}");
        };
        // Card 0 appears as two runs (rows 0-1 and 3-4) that resolve to one
        // entry; the final single-row 0b0010 run is discarded as noise.
        assert_eq!(deck.resolved_indices(), &[0]);
    }

    #[test]
    fn too_few_cards_still_carries_the_deck() {
        let format = format(3);
        let decoder = Decoder::new(DecodeParams::default());
        let mut resolver = DeckResolver::new();

        let words = [0b0001u16, 0b0001, 0b0001, 0b0010, 0b0010, 0b0010];
        let result = decoder.decode(&synthetic_mark_lines(&words), &format, &mut resolver);
        let DecodeResult::TooFewCards(deck) = result else {
            panic!("expected TooFewCards, got {result:?}");
        };
        assert_eq!(deck.resolved_indices(), &[0, 1]);
    }

    #[test]
    fn blurry_columns_are_gated() {
        let format = format(1);
        let decoder = Decoder::new(DecodeParams {
            min_sharpness: 0.5,
            ..DecodeParams::default()
        });
        let mut resolver = DeckResolver::new();

        let mut lines = synthetic_mark_lines(&[0b0001, 0b0010, 0b0100]);
        for line in &mut lines.lines {
            line.max_sharpness_unit_scalar = 0.1;
        }
        assert!(matches!(
            decoder.decode(&lines, &format, &mut resolver),
            DecodeResult::NotSharp
        ));
    }

    #[test]
    fn sharpness_gate_can_be_disabled() {
        let format = format(1);
        let decoder = Decoder::new(DecodeParams {
            enable_sharpness_detection: false,
            min_sharpness: 0.5,
            ..DecodeParams::default()
        });
        let mut resolver = DeckResolver::new();

        let mut lines = synthetic_mark_lines(&[0b0001, 0b0001, 0b0001]);
        for line in &mut lines.lines {
            line.max_sharpness_unit_scalar = 0.0;
        }
        assert!(matches!(
            decoder.decode(&lines, &format, &mut resolver),
            DecodeResult::Decoded(_)
        ));
    }

    #[test]
    fn column_count_mismatch_is_a_general_failure() {
        let format = format(1);
        let decoder = Decoder::new(DecodeParams::default());
        let mut resolver = DeckResolver::new();

        let mut lines = synthetic_mark_lines(&[0b0001, 0b0001]);
        lines.lines.pop();
        assert!(matches!(
            decoder.decode(&lines, &format, &mut resolver),
            DecodeResult::GeneralFailure(DecodeFailureReason::BitColumnMismatch { .. })
        ));
    }
}
