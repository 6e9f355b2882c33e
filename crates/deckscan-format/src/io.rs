//! JSON loading of deck-formats documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::deck_format::{DeckFormat, FormatSpec};
use crate::error::FormatError;

/// Top-level formats document: `{ "formats": [ ... ] }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormatsDocument {
    pub formats: Vec<FormatSpec>,
}

impl FormatsDocument {
    /// Parse a formats document from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a formats document from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Build every non-ignored format, failing on the first invalid one.
    pub fn build_formats(self) -> Result<Vec<DeckFormat>, FormatError> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for spec in self.formats {
            if spec.ignored {
                log::info!("skipping ignored format '{}' (id {})", spec.name, spec.id);
                continue;
            }
            formats.push(DeckFormat::new(spec)?);
        }
        Ok(formats)
    }
}
