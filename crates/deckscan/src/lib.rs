//! High-level facade crate for the `deckscan-*` workspace.
//!
//! A specially printed deck of cards carries a short bit word along one edge
//! of every card; stacked, the deck reads as a vertical barcode. This crate
//! wires the underlying pieces into one per-frame pipeline: locate the deck
//! in a luma frame, decode a card run per row, resolve the noisy scan matrix
//! into one ordering, and fuse recent frames into a confidence-scored
//! answer.
//!
//! ```
//! use deckscan::{ScanManager, ScanParams};
//!
//! let manager = ScanManager::new(ScanParams::default());
//! // for each camera frame:
//! //   let result = manager.process_frame(&frame.view(), &format);
//! ```

pub use deckscan_core as core;
pub use deckscan_decode as decode;
pub use deckscan_format as format;
pub use deckscan_search as search;

mod history;
mod manager;
mod params;
mod stats;

#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "tracing")]
pub mod logging;

pub use deckscan_core::{FrameError, LumaImage, LumaImageView};
pub use deckscan_decode::{Deck, DecodeResult, Decoder};
pub use deckscan_format::{CodeDefinition, CodeKind, DeckFormat, FormatError, FormatSpec};
pub use deckscan_search::{DeckSearch, MarkLines, SearchResult};

pub use history::{Consensus, History, HistoryParams};
pub use manager::{AnalysisResult, FrameFailure, ScanManager};
pub use params::{AnalysisParams, BatterySaverParams, ScanParams};
pub use stats::{AnalyzerStats, DecodeStats, ResultStats, SearchStats, ValidationStats};
