use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::LifecycleError;
use super::prompt::{image_prompt, text_prompt};
use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use crate::document::Document;
use crate::generation::{GenerationClient, GenerationRequest};
use crate::processor::ProcessorRegistry;
use crate::registry::{ArtifactRegistry, ResultArtifact};
use crate::sanitize::{redact_path, sanitize_filename};
use crate::storage::{move_file, remove_if_exists, ArtifactStorage};

const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(5);

/// A file part received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client, before sanitizing.
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One upload form submission. Either part may be missing.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file: Option<UploadedFile>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedUpload {
    /// Key for `GET /download/{id}`.
    pub id: String,
    pub original_name: String,
    pub markdown: String,
    /// Extraction failed and the model saw the error text instead of content.
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub entries: usize,
    pub files_removed: usize,
    pub failures: usize,
}

/// Owns the upload → extract → generate → register → download/purge flow.
///
/// Holds no lock across extraction or generation; the registry mutex only
/// guards inserts and removals.
pub struct Lifecycle {
    storage: ArtifactStorage,
    registry: Arc<ArtifactRegistry>,
    processors: Arc<ProcessorRegistry>,
    generator: Arc<dyn GenerationClient>,
    max_upload_bytes: u64,
    cleanup_delay: Duration,
}

impl Lifecycle {
    pub fn new(
        storage: ArtifactStorage,
        registry: Arc<ArtifactRegistry>,
        generator: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            storage,
            registry,
            processors: Arc::new(ProcessorRegistry::new()),
            generator,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cleanup_delay: DEFAULT_CLEANUP_DELAY,
        }
    }

    pub fn from_config(config: &Config, generator: Arc<dyn GenerationClient>) -> Self {
        Self::new(
            ArtifactStorage::from_config(&config.storage),
            Arc::new(ArtifactRegistry::new()),
            generator,
        )
        .with_max_upload_bytes(config.limits.max_upload_bytes)
        .with_cleanup_delay(config.download.cleanup_delay())
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    pub fn storage(&self) -> &ArtifactStorage {
        &self.storage
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Runs one upload to completion and registers the result for download.
    ///
    /// User input errors are detected before anything is written. On any later
    /// failure the persisted upload is deleted and nothing is registered.
    pub async fn process_upload(&self, upload: Upload) -> Result<ProcessedUpload, LifecycleError> {
        let file = upload.file.ok_or(LifecycleError::MissingDocument)?;
        let original_name =
            sanitize_filename(&file.file_name).ok_or(LifecycleError::MissingDocument)?;
        let instructions = upload
            .instructions
            .filter(|i| !i.trim().is_empty())
            .ok_or(LifecycleError::MissingInstructions)?;

        let size = file.data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(LifecycleError::FileTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let id = Uuid::new_v4();
        let span = info_span!("process_upload", document_id = %id, size);

        async {
            let source_path = self
                .storage
                .write_upload(&id, &original_name, &file.data)
                .await?;
            debug!(path = %redact_path(&source_path), "Upload persisted");

            let document = Document::new(id, source_path.clone(), &original_name, file.content_type);
            let outcome = self.generate_result(document, &instructions, file.data).await;

            // The upload never outlives its request, whatever the outcome.
            if let Err(e) = remove_if_exists(&source_path).await {
                warn!(error = %e, "Failed to delete upload");
            }

            let (result_path, markdown, degraded) = outcome?;
            self.registry
                .register(id.to_string(), result_path, original_name.clone());
            info!(degraded, "Result registered");

            Ok(ProcessedUpload {
                id: id.to_string(),
                original_name,
                markdown,
                degraded,
            })
        }
        .instrument(span)
        .await
    }

    async fn generate_result(
        &self,
        document: Document,
        instructions: &str,
        data: Vec<u8>,
    ) -> Result<(PathBuf, String, bool), LifecycleError> {
        let processors = Arc::clone(&self.processors);
        let document = tokio::task::spawn_blocking(move || {
            let mut document = document;
            processors.extract(&mut document);
            document
        })
        .await
        .map_err(|e| LifecycleError::Extraction(e.to_string()))?;

        let media_type = document.media_type();
        let (text, degraded) = document
            .extraction()
            .map(|e| (e.text.as_str(), e.degraded))
            .unwrap_or_default();

        let request = if media_type.is_image() {
            GenerationRequest::text(image_prompt(instructions))
                .with_attachment(media_type.as_mime(), data)
        } else {
            GenerationRequest::text(text_prompt(
                instructions,
                &document.original_name,
                &media_type,
                text,
            ))
        };

        let markdown = self.generator.generate(request).await?;
        let result_path = self.storage.write_result(&document.id, &markdown).await?;

        Ok((result_path, markdown, degraded))
    }

    /// Hands out a result exactly once.
    ///
    /// The entry is evicted and the file renamed to its single-use serving
    /// path before anything is returned, so a concurrent or repeated request
    /// for the same id gets `NotFound`. The serving copy is deleted when the
    /// returned guard is dropped.
    pub async fn download(&self, id: &str) -> Result<ServedArtifact, LifecycleError> {
        let not_found = || LifecycleError::NotFound { id: id.to_string() };

        let artifact = self.registry.lookup(id).ok_or_else(not_found)?;
        if !tokio::fs::try_exists(&artifact.result_path)
            .await
            .unwrap_or(false)
        {
            warn!(document_id = %id, "Registered result is missing on disk");
            return Err(LifecycleError::ResultMissing { id: id.to_string() });
        }

        // Another request may have won between lookup and evict.
        let artifact = self.registry.evict(id).ok_or_else(not_found)?;
        let serving_path = self.storage.serving_path(id);

        if let Err(e) = move_file(&artifact.result_path, &serving_path).await {
            discard(&artifact.result_path).await;
            return Err(e.into());
        }

        info!(document_id = %id, "Serving result");
        Ok(ServedArtifact {
            download_name: artifact.download_name(),
            path: serving_path,
            cleanup_delay: self.cleanup_delay,
        })
    }

    /// Drains the registry and deletes every result file that still exists.
    pub async fn purge_all(&self) -> PurgeReport {
        let drained = self.registry.sweep_all();
        let report = delete_results(drained).await;
        if report.entries > 0 {
            info!(
                entries = report.entries,
                removed = report.files_removed,
                "Purged registered results"
            );
        }
        report
    }

    /// Purges results registered more than `max_age` ago.
    pub async fn purge_expired(&self, max_age: Duration) -> PurgeReport {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return PurgeReport::default();
        };

        let report = delete_results(self.registry.sweep_older_than(cutoff)).await;
        if report.entries > 0 {
            info!(entries = report.entries, "Purged expired results");
        }
        report
    }
}

async fn delete_results(drained: Vec<(String, ResultArtifact)>) -> PurgeReport {
    let mut report = PurgeReport {
        entries: drained.len(),
        ..PurgeReport::default()
    };

    for (id, artifact) in drained {
        match remove_if_exists(&artifact.result_path).await {
            Ok(true) => report.files_removed += 1,
            Ok(false) => debug!(document_id = %id, "Result already gone"),
            Err(e) => {
                report.failures += 1;
                warn!(document_id = %id, error = %e, "Failed to delete result");
            }
        }
    }

    report
}

async fn discard(path: &Path) {
    if let Err(e) = remove_if_exists(path).await {
        warn!(path = %redact_path(path), error = %e, "Failed to delete result");
    }
}

/// A result moved to its serving path.
///
/// Dropping the guard schedules deletion of the file after the grace period.
/// Keep it alive until the response body has been sent.
#[derive(Debug)]
pub struct ServedArtifact {
    path: PathBuf,
    download_name: String,
    cleanup_delay: Duration,
}

impl ServedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<originalName>_result.md`
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    pub async fn open(&self) -> Result<tokio::fs::File, LifecycleError> {
        tokio::fs::File::open(&self.path).await.map_err(|e| {
            LifecycleError::Storage(crate::error::StorageError::ReadFile {
                path: self.path.clone(),
                source: e,
            })
        })
    }
}

impl Drop for ServedArtifact {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        let delay = self.cleanup_delay;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    match remove_if_exists(&path).await {
                        Ok(_) => debug!(path = %redact_path(&path), "Served result deleted"),
                        Err(e) => warn!(error = %e, "Failed to delete served result"),
                    }
                });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to delete served result {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}
