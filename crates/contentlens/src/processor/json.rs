use crate::document::Document;
use crate::error::ProcessError;
use crate::processor::text::read_utf8;
use crate::processor::{DocumentProcessor, MediaType};

/// Parses JSON and re-serializes it with two-space indentation.
///
/// The round trip validates the document and normalizes its layout; member order
/// is preserved.
pub struct JsonProcessor;

impl JsonProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for JsonProcessor {
    fn extract(&self, document: &Document) -> Result<String, ProcessError> {
        let raw = read_utf8(document)?;
        normalize_json(&raw)
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        matches!(media_type, MediaType::Json)
    }
}

fn normalize_json(raw: &str) -> Result<String, ProcessError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
