//! Individual printed marks within a code layout.

use serde::{Deserialize, Serialize};

/// Kind of one printed mark along the card edge.
///
/// Landmarks anchor position, bits carry data, spaces separate them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkKind {
    Landmark,
    Space,
    /// Data mark contributing bit `index` of the card code word.
    Bit { index: usize },
}

impl MarkKind {
    #[inline]
    pub fn is_landmark(&self) -> bool {
        matches!(self, MarkKind::Landmark)
    }

    #[inline]
    pub fn is_space(&self) -> bool {
        matches!(self, MarkKind::Space)
    }

    #[inline]
    pub fn bit_index(&self) -> Option<usize> {
        match self {
            MarkKind::Bit { index } => Some(*index),
            _ => None,
        }
    }

    /// Layout class ignoring the bit index; used for palindrome checks.
    #[inline]
    pub(crate) fn class(&self) -> u8 {
        match self {
            MarkKind::Landmark => 0,
            MarkKind::Space => 1,
            MarkKind::Bit { .. } => 2,
        }
    }
}

/// One finalized mark: physical extent in mm plus extents normalized by the
/// total layout width. Immutable once the owning layout is finalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkDefinition {
    pub kind: MarkKind,
    /// Position of this mark within the left-to-right layout.
    pub position_index: usize,
    pub start_mm: f32,
    pub width_mm: f32,
    pub normalized_start: f32,
    pub normalized_width: f32,
    /// For landmarks: how far a traced landmark edge may drift, as a ratio of
    /// the landmark width, before tracing stops. Derived from the adjacent
    /// space widths.
    pub landmark_min_gap_ratio: f32,
}

impl MarkDefinition {
    #[inline]
    pub fn normalized_end(&self) -> f32 {
        self.normalized_start + self.normalized_width
    }

    #[inline]
    pub fn normalized_center(&self) -> f32 {
        self.normalized_start + 0.5 * self.normalized_width
    }

    #[inline]
    pub fn end_mm(&self) -> f32 {
        self.start_mm + self.width_mm
    }
}
