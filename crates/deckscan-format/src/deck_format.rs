//! Validated deck formats: card codes, face codes and derived tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::code_definition::CodeDefinition;
use crate::ecc::{bit_reverse, min_code_distance, EccTables};
use crate::error::FormatError;
use crate::mark::MarkKind;

/// Orientation behavior of a symbology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    /// One orientation only; the layout must not be palindromic.
    Normal,
    /// The layout reads identically upside down; orientation is unknowable.
    Palindrome,
    /// Each card's bit-reversed code is itself a distinct valid card.
    Reversible,
}

impl CodeKind {
    #[inline]
    fn name(&self) -> &'static str {
        match self {
            CodeKind::Normal => "normal",
            CodeKind::Palindrome => "palindrome",
            CodeKind::Reversible => "reversible",
        }
    }

    #[inline]
    fn wants_palindrome_layout(&self) -> bool {
        !matches!(self, CodeKind::Normal)
    }
}

/// One mark entry in a formats document.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MarkSpec {
    #[serde(rename = "type")]
    pub kind: MarkSpecKind,
    #[serde(rename = "widthMM")]
    pub width_mm: f32,
}

/// Mark kind as written in the formats document (bit indices are implicit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkSpecKind {
    Landmark,
    Space,
    Bit,
}

/// Declarative description of one deck format, as found in the formats
/// document. Build a validated [`DeckFormat`] with [`DeckFormat::new`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormatSpec {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
    #[serde(default, rename = "invertLuma")]
    pub invert_luma: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(rename = "physicalLengthMM")]
    pub physical_length_mm: f32,
    #[serde(rename = "physicalWidthMM")]
    pub physical_width_mm: f32,
    #[serde(rename = "printableMaxWidthMM")]
    pub printable_max_width_mm: f32,
    #[serde(rename = "physicalStackHeight52CardsMM")]
    pub stack_height_52_mm: f32,
    #[serde(rename = "physicalCompressedStackHeight52CardsMM")]
    pub compressed_stack_height_52_mm: f32,
    #[serde(rename = "minCardCount")]
    pub min_card_count: usize,
    /// One bit word per card, new-deck order. May be longer than
    /// `face_codes`; extra entries are truncated.
    #[serde(rename = "cardCodesNdo")]
    pub card_codes_ndo: Vec<u16>,
    /// One printable face code per card, new-deck order.
    #[serde(rename = "faceCodesNdo")]
    pub face_codes_ndo: Vec<String>,
    /// Face codes in the order a physical test deck is stacked, if any.
    #[serde(default, rename = "faceCodesTestDeckOrder")]
    pub face_codes_test_deck_order: Vec<String>,
    pub marks: Vec<MarkSpec>,
}

/// A validated, immutable deck format.
///
/// Constructed once at startup; shared by reference across the pipeline.
#[derive(Clone, Debug)]
pub struct DeckFormat {
    id: u32,
    name: String,
    description: String,
    kind: CodeKind,
    invert_luma: bool,
    physical_length_mm: f32,
    physical_width_mm: f32,
    printable_max_width_mm: f32,
    stack_height_52_mm: f32,
    compressed_stack_height_52_mm: f32,
    min_card_count: usize,
    card_codes: Vec<u16>,
    reversed_codes: Vec<u16>,
    code_to_index: HashMap<u16, usize>,
    face_codes: Vec<String>,
    face_code_to_index: HashMap<String, usize>,
    test_deck_order: Vec<usize>,
    ecc: EccTables,
    code: CodeDefinition,
}

impl DeckFormat {
    /// Validate `spec` and derive every runtime table.
    pub fn new(spec: FormatSpec) -> Result<Self, FormatError> {
        let layout: Vec<(MarkKind, f32)> = spec
            .marks
            .iter()
            .map(|m| {
                let kind = match m.kind {
                    MarkSpecKind::Landmark => MarkKind::Landmark,
                    MarkSpecKind::Space => MarkKind::Space,
                    MarkSpecKind::Bit => MarkKind::Bit { index: 0 },
                };
                (kind, m.width_mm)
            })
            .collect();
        let code = CodeDefinition::finalize(&layout)?;
        code.prepare_for_decode(spec.kind.name(), spec.kind.wants_palindrome_layout())?;

        let bits = code.bit_count();
        let faces = spec.face_codes_ndo.len();
        if spec.card_codes_ndo.len() < faces {
            return Err(FormatError::TooFewCardCodes {
                codes: spec.card_codes_ndo.len(),
                faces,
            });
        }
        let mut card_codes = spec.card_codes_ndo;
        card_codes.truncate(faces);

        if spec.min_card_count > card_codes.len() {
            return Err(FormatError::MinCardCountTooLarge {
                min: spec.min_card_count,
                max: card_codes.len(),
            });
        }

        let mut code_to_index = HashMap::with_capacity(card_codes.len() * 2);
        for (i, &c) in card_codes.iter().enumerate() {
            if u32::from(c) >= 1u32 << bits {
                return Err(FormatError::CodeOutOfRange { code: c, bits });
            }
            if code_to_index.insert(c, i).is_some() {
                return Err(FormatError::DuplicateCardCode { code: c });
            }
        }

        let reversed_codes = if spec.kind == CodeKind::Reversible {
            let max = card_codes.len();
            let mut reversed = Vec::with_capacity(max);
            for (i, &c) in card_codes.iter().enumerate() {
                let r = bit_reverse(c, bits);
                if code_to_index.insert(r, max + i).is_some() {
                    return Err(FormatError::ReversedCodeCollision { code: r });
                }
                reversed.push(r);
            }
            reversed
        } else {
            Vec::new()
        };

        let mut face_code_to_index = HashMap::with_capacity(faces);
        for (i, f) in spec.face_codes_ndo.iter().enumerate() {
            face_code_to_index.insert(f.clone(), i);
        }
        let test_deck_order = spec
            .face_codes_test_deck_order
            .iter()
            .map(|f| {
                face_code_to_index
                    .get(f)
                    .copied()
                    .ok_or_else(|| FormatError::UnknownFaceCode { face: f.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut ecc_codes = card_codes.clone();
        ecc_codes.extend_from_slice(&reversed_codes);
        let ecc = EccTables::build(&ecc_codes, bits);

        log::debug!(
            "format '{}' (id {}): {} cards, {} bits, min pairwise distance {}",
            spec.name,
            spec.id,
            card_codes.len(),
            bits,
            min_code_distance(&ecc_codes)
        );

        Ok(Self {
            id: spec.id,
            name: spec.name,
            description: spec.description,
            kind: spec.kind,
            invert_luma: spec.invert_luma,
            physical_length_mm: spec.physical_length_mm,
            physical_width_mm: spec.physical_width_mm,
            printable_max_width_mm: spec.printable_max_width_mm,
            stack_height_52_mm: spec.stack_height_52_mm,
            compressed_stack_height_52_mm: spec.compressed_stack_height_52_mm,
            min_card_count: spec.min_card_count,
            card_codes,
            reversed_codes,
            code_to_index,
            face_codes: spec.face_codes_ndo,
            face_code_to_index,
            test_deck_order,
            ecc,
            code,
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    #[inline]
    pub fn is_reversible(&self) -> bool {
        self.kind == CodeKind::Reversible
    }

    #[inline]
    pub fn invert_luma(&self) -> bool {
        self.invert_luma
    }

    #[inline]
    pub fn code(&self) -> &CodeDefinition {
        &self.code
    }

    #[inline]
    pub fn bit_count(&self) -> u32 {
        self.code.bit_count()
    }

    #[inline]
    pub fn min_card_count(&self) -> usize {
        self.min_card_count
    }

    /// Number of distinct physical cards.
    #[inline]
    pub fn max_card_count(&self) -> usize {
        self.card_codes.len()
    }

    /// Number of distinct card indices the decoder can emit; reversed
    /// variants occupy `[max_card_count, 2 * max_card_count)`.
    #[inline]
    pub fn max_card_count_with_reversed(&self) -> usize {
        if self.is_reversible() {
            2 * self.card_codes.len()
        } else {
            self.card_codes.len()
        }
    }

    #[inline]
    pub fn card_codes(&self) -> &[u16] {
        &self.card_codes
    }

    #[inline]
    pub fn reversed_codes(&self) -> &[u16] {
        &self.reversed_codes
    }

    /// Forward card index for `index`, folding reversed variants back.
    #[inline]
    pub fn forward_index(&self, index: usize) -> usize {
        if index >= self.card_codes.len() {
            index - self.card_codes.len()
        } else {
            index
        }
    }

    /// Whether `index` identifies a reversed variant.
    #[inline]
    pub fn is_reversed_index(&self, index: usize) -> bool {
        index >= self.card_codes.len()
    }

    /// Printable face code; reversed variants are parenthesized.
    pub fn face_code(&self, index: usize) -> String {
        let fwd = self.forward_index(index);
        let face = self
            .face_codes
            .get(fwd)
            .map(String::as_str)
            .unwrap_or("??");
        if self.is_reversed_index(index) {
            format!("({face})")
        } else {
            face.to_owned()
        }
    }

    #[inline]
    pub fn index_for_face_code(&self, face: &str) -> Option<usize> {
        self.face_code_to_index.get(face).copied()
    }

    #[inline]
    pub fn index_for_code(&self, code: u16) -> Option<usize> {
        self.code_to_index.get(&code).copied()
    }

    /// Card indices of the physical test deck, if the format declares one.
    #[inline]
    pub fn test_deck_order(&self) -> &[usize] {
        &self.test_deck_order
    }

    #[inline]
    pub fn ecc(&self) -> &EccTables {
        &self.ecc
    }

    #[inline]
    pub fn physical_width_mm(&self) -> f32 {
        self.physical_width_mm
    }

    #[inline]
    pub fn physical_length_mm(&self) -> f32 {
        self.physical_length_mm
    }

    #[inline]
    pub fn printable_max_width_mm(&self) -> f32 {
        self.printable_max_width_mm
    }

    /// Height of a single card edge in the (uncompressed) stack.
    #[inline]
    pub fn card_height_mm(&self) -> f32 {
        self.stack_height_52_mm / 52.0
    }

    /// Expected stack height for `cards` cards, bounded below by the
    /// compressed measurement.
    pub fn expected_stack_height_mm(&self, cards: usize) -> f32 {
        let per_card_min = self.compressed_stack_height_52_mm / 52.0;
        let per_card_max = self.stack_height_52_mm / 52.0;
        (cards as f32 * per_card_max).max(cards as f32 * per_card_min)
    }

    /// Pairwise minimum Hamming distance over the effective code set.
    pub fn min_code_distance(&self) -> u32 {
        let mut all = self.card_codes.clone();
        all.extend_from_slice(&self.reversed_codes);
        min_code_distance(&all)
    }
}
