use crate::document::Document;
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, MediaType};

/// Images are not OCR'd. The generation client receives the raw bytes instead,
/// so the extracted text is only a marker naming the file.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for ImageProcessor {
    fn extract(&self, document: &Document) -> Result<String, ProcessError> {
        Ok(format!("[Image: {}]", document.original_name))
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        media_type.is_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    #[test]
    fn test_placeholder_uses_original_name() {
        let doc = Document::new(
            Uuid::new_v4(),
            PathBuf::from("/nonexistent/abc_cat.jpg"),
            "cat.jpg",
            "image/jpeg",
        );
        assert_eq!(ImageProcessor::new().extract(&doc).unwrap(), "[Image: cat.jpg]");
    }

    #[test]
    fn test_supports_any_image_subtype() {
        let processor = ImageProcessor::new();
        assert!(processor.supports(&MediaType::Image("image/png".into())));
        assert!(processor.supports(&MediaType::Image("image/svg+xml".into())));
        assert!(!processor.supports(&MediaType::PlainText));
        assert!(!processor.supports(&MediaType::Other("video/mp4".into())));
    }
}
