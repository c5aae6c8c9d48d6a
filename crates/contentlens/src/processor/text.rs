use crate::document::Document;
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, MediaType};

/// Plain text and markdown, read verbatim as UTF-8.
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    fn extract(&self, document: &Document) -> Result<String, ProcessError> {
        read_utf8(document)
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        matches!(media_type, MediaType::PlainText | MediaType::Markdown)
    }
}

pub(crate) fn read_utf8(document: &Document) -> Result<String, ProcessError> {
    std::fs::read_to_string(&document.source_path).map_err(|e| ProcessError::ReadDocument {
        path: document.source_path.clone(),
        source: e,
    })
}
