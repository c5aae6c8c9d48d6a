use thiserror::Error;

use crate::error::StorageError;
use crate::generation::GenerationError;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("No document was uploaded")]
    MissingDocument,

    #[error("No instructions were provided")]
    MissingInstructions,

    #[error("File is too large ({size} bytes, limit is {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("No result found for '{id}'")]
    NotFound { id: String },

    #[error("Result file for '{id}' no longer exists")]
    ResultMissing { id: String },

    #[error("Error generating response: {0}")]
    Generation(#[from] GenerationError),

    #[error("Error storing files: {0}")]
    Storage(#[from] StorageError),

    #[error("Text extraction task failed: {0}")]
    Extraction(String),
}

impl LifecycleError {
    /// Errors caused by the request itself. These never touch the filesystem
    /// or the registry.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDocument
                | Self::MissingInstructions
                | Self::FileTooLarge { .. }
                | Self::NotFound { .. }
                | Self::ResultMissing { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ResultMissing { .. })
    }
}
