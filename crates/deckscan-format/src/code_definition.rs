//! Finalized mark layout of one symbology.

use crate::error::FormatError;
use crate::mark::{MarkDefinition, MarkKind};

/// Immutable, finalized description of the printed mark sequence along one
/// card edge.
///
/// Built left-to-right from physical mark widths; [`CodeDefinition::finalize`]
/// derives normalized extents, the start/interior/end landmark partition, the
/// per-bit neighbor landmarks used for mark-line interpolation, and the
/// landmark drift bounds consumed during extent tracing.
#[derive(Clone, Debug)]
pub struct CodeDefinition {
    marks: Vec<MarkDefinition>,
    width_mm: f32,
    narrowest_mark_mm: f32,
    start_landmarks: Vec<usize>,
    interior_landmarks: Vec<usize>,
    end_landmarks: Vec<usize>,
    /// Mark indices of bit marks, ordered by bit index (== left-to-right).
    bit_marks: Vec<usize>,
    /// Per bit mark: nearest landmark mark index on each side.
    bit_neighbors: Vec<(usize, usize)>,
}

impl CodeDefinition {
    /// Finalize a left-to-right sequence of `(kind-without-index, width_mm)`
    /// marks. Bit indices are assigned in order of appearance.
    pub fn finalize(layout: &[(MarkKind, f32)]) -> Result<Self, FormatError> {
        if layout.is_empty() {
            return Err(FormatError::EmptyLayout);
        }
        if !layout[0].0.is_landmark() || !layout[layout.len() - 1].0.is_landmark() {
            return Err(FormatError::MissingEdgeLandmark);
        }

        let mut marks = Vec::with_capacity(layout.len());
        let mut start_mm = 0.0f32;
        let mut bit_index = 0usize;
        let mut narrowest = f32::INFINITY;

        for (position_index, &(kind, width_mm)) in layout.iter().enumerate() {
            if !(width_mm > 0.0) {
                return Err(FormatError::NonPositiveWidth {
                    index: position_index,
                    width_mm,
                });
            }
            let kind = match kind {
                MarkKind::Bit { .. } => {
                    let k = MarkKind::Bit { index: bit_index };
                    bit_index += 1;
                    k
                }
                other => other,
            };
            narrowest = narrowest.min(width_mm);
            marks.push(MarkDefinition {
                kind,
                position_index,
                start_mm,
                width_mm,
                normalized_start: 0.0,
                normalized_width: 0.0,
                landmark_min_gap_ratio: 0.0,
            });
            start_mm += width_mm;
        }

        if bit_index == 0 {
            return Err(FormatError::NoBits);
        }

        let width_mm = start_mm;
        for mark in &mut marks {
            mark.normalized_start = mark.start_mm / width_mm;
            mark.normalized_width = mark.width_mm / width_mm;
        }

        let first_bit = marks
            .iter()
            .position(|m| m.kind.bit_index().is_some())
            .expect("bit marks exist");
        let last_bit = marks
            .iter()
            .rposition(|m| m.kind.bit_index().is_some())
            .expect("bit marks exist");

        let mut start_landmarks = Vec::new();
        let mut interior_landmarks = Vec::new();
        let mut end_landmarks = Vec::new();
        for (i, mark) in marks.iter().enumerate() {
            if !mark.kind.is_landmark() {
                continue;
            }
            if i < first_bit {
                start_landmarks.push(i);
            } else if i > last_bit {
                end_landmarks.push(i);
            } else {
                interior_landmarks.push(i);
            }
        }

        derive_gap_ratios(&mut marks);

        let mut bit_marks: Vec<usize> = marks
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind.bit_index().is_some())
            .map(|(i, _)| i)
            .collect();
        bit_marks.sort_by_key(|&i| marks[i].kind.bit_index().expect("filtered to bit marks"));

        let landmark_set: Vec<usize> = marks
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind.is_landmark())
            .map(|(i, _)| i)
            .collect();
        let bit_neighbors = bit_marks
            .iter()
            .map(|&b| {
                let left = landmark_set
                    .iter()
                    .copied()
                    .filter(|&l| l < b)
                    .max()
                    .expect("layout starts with a landmark");
                let right = landmark_set
                    .iter()
                    .copied()
                    .find(|&l| l > b)
                    .expect("layout ends with a landmark");
                (left, right)
            })
            .collect();

        Ok(Self {
            marks,
            width_mm,
            narrowest_mark_mm: narrowest,
            start_landmarks,
            interior_landmarks,
            end_landmarks,
            bit_marks,
            bit_neighbors,
        })
    }

    /// Enforce the palindrome rule for the owning format kind.
    ///
    /// Palindrome and reversible formats must have a type+width palindromic
    /// layout (so an upside-down deck scans identically); a normal format
    /// must not, or orientation would be undetectable.
    pub fn prepare_for_decode(&self, kind_name: &'static str, wants_palindrome: bool) -> Result<(), FormatError> {
        let is_palindrome = self.is_layout_palindrome();
        if wants_palindrome && !is_palindrome {
            return Err(FormatError::LayoutNotPalindrome { kind: kind_name });
        }
        if !wants_palindrome && is_palindrome {
            return Err(FormatError::UnexpectedPalindrome);
        }
        Ok(())
    }

    /// Whether the type+width sequence reads the same in both directions.
    pub fn is_layout_palindrome(&self) -> bool {
        let n = self.marks.len();
        for i in 0..n / 2 {
            let a = &self.marks[i];
            let b = &self.marks[n - 1 - i];
            if a.kind.class() != b.kind.class() {
                return false;
            }
            if (a.width_mm - b.width_mm).abs() > 1e-4 {
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn marks(&self) -> &[MarkDefinition] {
        &self.marks
    }

    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_mm
    }

    #[inline]
    pub fn bit_count(&self) -> u32 {
        self.bit_marks.len() as u32
    }

    #[inline]
    pub fn start_landmarks(&self) -> &[usize] {
        &self.start_landmarks
    }

    #[inline]
    pub fn interior_landmarks(&self) -> &[usize] {
        &self.interior_landmarks
    }

    #[inline]
    pub fn end_landmarks(&self) -> &[usize] {
        &self.end_landmarks
    }

    #[inline]
    pub fn landmark_count(&self) -> usize {
        self.start_landmarks.len() + self.interior_landmarks.len() + self.end_landmarks.len()
    }

    /// Mark indices of bit marks ordered by bit index.
    #[inline]
    pub fn bit_marks(&self) -> &[usize] {
        &self.bit_marks
    }

    /// Per bit mark, the nearest landmark mark index on each side.
    #[inline]
    pub fn bit_neighbors(&self) -> &[(usize, usize)] {
        &self.bit_neighbors
    }

    /// Minimum measured deck width, in samples along the scan line, below
    /// which the narrowest mark cannot be resolved.
    pub fn calc_min_sample_width(&self) -> f32 {
        2.0 * self.width_mm / self.narrowest_mark_mm
    }
}

/// Landmark drift bound: half the narrower adjacent space, as a ratio of the
/// landmark width. Landmarks with no adjacent space fall back to 0.5.
fn derive_gap_ratios(marks: &mut [MarkDefinition]) {
    let n = marks.len();
    for i in 0..n {
        if !marks[i].kind.is_landmark() {
            continue;
        }
        let left = i
            .checked_sub(1)
            .map(|j| &marks[j])
            .filter(|m| m.kind.is_space())
            .map(|m| m.width_mm);
        let right = marks
            .get(i + 1)
            .filter(|m| m.kind.is_space())
            .map(|m| m.width_mm);
        let gap = match (left, right) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        };
        marks[i].landmark_min_gap_ratio = match gap {
            Some(g) => g / (2.0 * marks[i].width_mm),
            None => 0.5,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simple_layout() -> Vec<(MarkKind, f32)> {
        // L S b S b S L  (palindromic classes and widths)
        vec![
            (MarkKind::Landmark, 4.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Bit { index: 0 }, 2.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Bit { index: 0 }, 2.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Landmark, 4.0),
        ]
    }

    #[test]
    fn finalize_normalizes_and_partitions() {
        let code = CodeDefinition::finalize(&simple_layout()).expect("finalize");
        assert_relative_eq!(code.width_mm(), 18.0);
        assert_eq!(code.bit_count(), 2);
        assert_eq!(code.start_landmarks(), &[0]);
        assert_eq!(code.end_landmarks(), &[6]);
        assert!(code.interior_landmarks().is_empty());

        let first = &code.marks()[0];
        assert_relative_eq!(first.normalized_start, 0.0);
        assert_relative_eq!(first.normalized_width, 4.0 / 18.0);
        let last = &code.marks()[6];
        assert_relative_eq!(last.normalized_end(), 1.0, epsilon = 1e-6);

        // Bits were renumbered left-to-right.
        assert_eq!(code.marks()[2].kind, MarkKind::Bit { index: 0 });
        assert_eq!(code.marks()[4].kind, MarkKind::Bit { index: 1 });
        assert_eq!(code.bit_neighbors(), &[(0, 6), (0, 6)]);
    }

    #[test]
    fn interior_landmark_gap_ratio_uses_narrower_space() {
        let layout = vec![
            (MarkKind::Landmark, 4.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Bit { index: 0 }, 2.0),
            (MarkKind::Space, 3.0),
            (MarkKind::Landmark, 2.0),
            (MarkKind::Space, 1.0),
            (MarkKind::Bit { index: 0 }, 2.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Landmark, 4.0),
        ];
        let code = CodeDefinition::finalize(&layout).expect("finalize");
        assert_eq!(code.interior_landmarks(), &[4]);
        let lm = &code.marks()[4];
        assert_relative_eq!(lm.landmark_min_gap_ratio, 1.0 / 4.0);
        assert_eq!(code.bit_neighbors(), &[(0, 4), (4, 8)]);
    }

    #[test]
    fn rejects_missing_edge_landmarks() {
        let layout = vec![
            (MarkKind::Space, 2.0),
            (MarkKind::Bit { index: 0 }, 2.0),
            (MarkKind::Landmark, 4.0),
        ];
        assert!(matches!(
            CodeDefinition::finalize(&layout),
            Err(FormatError::MissingEdgeLandmark)
        ));
    }

    #[test]
    fn rejects_bitless_layout() {
        let layout = vec![
            (MarkKind::Landmark, 4.0),
            (MarkKind::Space, 2.0),
            (MarkKind::Landmark, 4.0),
        ];
        assert!(matches!(
            CodeDefinition::finalize(&layout),
            Err(FormatError::NoBits)
        ));
    }

    #[test]
    fn palindrome_rule_is_enforced_both_ways() {
        let code = CodeDefinition::finalize(&simple_layout()).expect("finalize");
        assert!(code.is_layout_palindrome());
        assert!(code.prepare_for_decode("palindrome", true).is_ok());
        assert!(matches!(
            code.prepare_for_decode("normal", false),
            Err(FormatError::UnexpectedPalindrome)
        ));

        let mut asym = simple_layout();
        asym[1].1 = 3.0;
        let code = CodeDefinition::finalize(&asym).expect("finalize");
        assert!(!code.is_layout_palindrome());
        assert!(code.prepare_for_decode("normal", false).is_ok());
        assert!(matches!(
            code.prepare_for_decode("reversible", true),
            Err(FormatError::LayoutNotPalindrome { .. })
        ));
    }

    #[test]
    fn min_sample_width_scales_with_narrowest_mark() {
        let code = CodeDefinition::finalize(&simple_layout()).expect("finalize");
        assert_relative_eq!(code.calc_min_sample_width(), 2.0 * 18.0 / 2.0);
    }
}
