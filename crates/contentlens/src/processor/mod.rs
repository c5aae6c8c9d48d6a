pub mod docx;
pub mod image;
pub mod json;
pub mod media_type;
pub mod text;

pub use media_type::{resolve_type, MediaType};

use tracing::{debug, info_span, warn};

use crate::document::Document;
use crate::error::ProcessError;

/// Outcome of running the extractor on a document.
///
/// `degraded` is set when a format extractor failed and `text` carries the
/// `Error extracting text: ...` placeholder instead of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub degraded: bool,
}

impl Extraction {
    fn content(text: String) -> Self {
        Self {
            text,
            degraded: false,
        }
    }

    fn failed(error: &ProcessError) -> Self {
        Self {
            text: format!("Error extracting text: {}", error),
            degraded: true,
        }
    }
}

pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<String, ProcessError>;
    fn supports(&self, media_type: &MediaType) -> bool;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(text::TextProcessor::new()),
            Box::new(json::JsonProcessor::new()),
            Box::new(docx::DocxProcessor::new()),
            Box::new(image::ImageProcessor::new()),
        ];

        Self { processors }
    }

    /// Extracts the document's text, caching it on the document.
    ///
    /// A second call returns the cached extraction without touching the file.
    /// Never fails: extractor errors are folded into the returned text.
    pub fn extract<'a>(&self, document: &'a mut Document) -> &'a Extraction {
        let extraction = match document.extraction.take() {
            Some(cached) => {
                debug!(document_id = %document.id, "Using cached extraction");
                cached
            }
            None => self.run(document),
        };
        document.extraction.insert(extraction)
    }

    fn run(&self, document: &Document) -> Extraction {
        let media_type = document.media_type();
        let _span = info_span!("extract",
            document_id = %document.id,
            media_type = %media_type,
        )
        .entered();

        let Some(processor) = self.processors.iter().find(|p| p.supports(&media_type)) else {
            debug!("No extractor for media type");
            return Extraction::content(format!(
                "Unsupported file type: {}",
                document.declared_type
            ));
        };

        match processor.extract(document) {
            Ok(text) => {
                debug!(chars = text.len(), "Extraction complete");
                Extraction::content(text)
            }
            Err(e) => {
                warn!(error = %e, "Extraction failed, continuing with error text");
                Extraction::failed(&e)
            }
        }
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
