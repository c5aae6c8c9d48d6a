pub mod config;
pub mod document;
pub mod error;
pub mod generation;
pub mod lifecycle;
pub mod logging;
pub mod processor;
pub mod registry;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use config::{load_config, load_from_env, Config};
pub use document::Document;
pub use error::{ConfigError, ContentLensError, ProcessError, Result, StorageError};
pub use generation::{GeminiClient, GenerationClient, GenerationError, GenerationRequest};
pub use lifecycle::{
    spawn_retention_sweeper, Lifecycle, LifecycleError, ProcessedUpload, PurgeReport,
    ServedArtifact, Upload, UploadedFile,
};
pub use processor::{resolve_type, Extraction, MediaType, ProcessorRegistry};
pub use registry::{ArtifactRegistry, ResultArtifact};
pub use secrets::{SecretError, SecretSource};
pub use storage::ArtifactStorage;
