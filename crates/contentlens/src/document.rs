//! An uploaded file during its single processing window.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::processor::{resolve_type, Extraction, MediaType};

#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier shared by the upload file, the result file and the registry entry.
    pub id: Uuid,
    /// Where the upload was persisted.
    pub source_path: PathBuf,
    /// Filename supplied by the user.
    pub original_name: String,
    /// MIME type reported by the upload transport.
    pub declared_type: String,
    pub uploaded_at: DateTime<Utc>,
    /// `None` until the processor registry has run, never an "empty document" marker.
    pub(crate) extraction: Option<Extraction>,
}

impl Document {
    pub fn new(
        id: Uuid,
        source_path: PathBuf,
        original_name: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_path,
            original_name: original_name.into(),
            declared_type: declared_type.into(),
            uploaded_at: Utc::now(),
            extraction: None,
        }
    }

    /// The type used for dispatch, inferred from the filename when the declared
    /// type is the generic fallback.
    pub fn media_type(&self) -> MediaType {
        resolve_type(&self.declared_type, &self.original_name)
    }

    pub fn is_image(&self) -> bool {
        self.media_type().is_image()
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extraction.as_ref().map(|e| e.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::media_type::OCTET_STREAM;

    #[test]
    fn test_new_document_is_not_extracted() {
        let doc = Document::new(Uuid::new_v4(), PathBuf::from("x"), "a.txt", "text/plain");
        assert!(doc.extraction().is_none());
        assert!(doc.extracted_text().is_none());
    }

    #[test]
    fn test_media_type_uses_inference() {
        let doc = Document::new(Uuid::new_v4(), PathBuf::from("x"), "a.md", OCTET_STREAM);
        assert_eq!(doc.media_type(), MediaType::Markdown);
        assert!(!doc.is_image());
    }
}
