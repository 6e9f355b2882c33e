//! Deck search: prioritized scan lines, mark detection, code matching and
//! extent tracing.
//!
//! The entry point is [`DeckSearch::search`]: given a luma frame and an
//! active [`deckscan_format::DeckFormat`], it walks candidate scan lines in
//! priority order, detects marks along each line, matches them against the
//! format's code layout, traces the deck's vertical extents, and produces
//! [`MarkLines`] ready for per-row decoding.

mod deck_search;
mod mark_detect;
mod mark_lines;
mod matcher;
mod params;
mod search_lines;
mod trace;

pub use deck_search::{DeckSearch, SearchResult};
pub use mark_detect::{MarkDetector, MarkLocation};
pub use mark_lines::{MarkLine, MarkLines, MAX_SAMPLE_ROWS};
pub use matcher::{match_code, DeckMatch};
pub use params::SearchParams;
pub use search_lines::{materialize_line, SearchLineSpec, SearchLines};
pub use trace::{trace_extents, TracedExtents};
