//! Format construction and validation errors.

/// Errors raised while building or validating a deck format.
///
/// These only occur at startup; per-frame outcomes are modelled as result
/// enums, never as errors.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("code layout is empty")]
    EmptyLayout,

    #[error("code layout must start and end with a landmark")]
    MissingEdgeLandmark,

    #[error("code layout carries no bit marks")]
    NoBits,

    #[error("mark {index} has non-positive width {width_mm} mm")]
    NonPositiveWidth { index: usize, width_mm: f32 },

    #[error("format type '{kind}' requires a palindromic mark layout")]
    LayoutNotPalindrome { kind: &'static str },

    #[error("mark layout is palindromic but format type 'normal' forbids it")]
    UnexpectedPalindrome,

    #[error("card code {code:#x} needs more than {bits} bits")]
    CodeOutOfRange { code: u16, bits: u32 },

    #[error("duplicate card code {code:#x}")]
    DuplicateCardCode { code: u16 },

    #[error("reversed card code {code:#x} collides with another card code")]
    ReversedCodeCollision { code: u16 },

    #[error("{codes} card codes cannot cover {faces} face codes")]
    TooFewCardCodes { codes: usize, faces: usize },

    #[error("minCardCount {min} exceeds the {max} cards the format defines")]
    MinCardCountTooLarge { min: usize, max: usize },

    #[error("test deck order names unknown face code '{face}'")]
    UnknownFaceCode { face: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
