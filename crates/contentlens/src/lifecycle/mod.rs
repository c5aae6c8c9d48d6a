//! Upload processing and the single-use result lifecycle.

pub mod controller;
pub mod error;
pub mod prompt;
pub mod retention;

pub use controller::{
    Lifecycle, ProcessedUpload, PurgeReport, ServedArtifact, Upload, UploadedFile,
};
pub use error::LifecycleError;
pub use retention::spawn_retention_sweeper;
