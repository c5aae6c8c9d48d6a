#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use contentlens::generation::{GenerationClient, GenerationError, GenerationRequest};
use contentlens::lifecycle::{Lifecycle, Upload, UploadedFile};
use contentlens::registry::ArtifactRegistry;
use contentlens::storage::ArtifactStorage;

/// Replies with a fixed answer, or a fixed failure, and records every request.
pub struct StubGenerator {
    reply: Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StubGenerator {
    pub fn replying(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Ok(answer) => Ok(answer.clone()),
            Err(message) => Err(GenerationError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

/// Isolated upload/result directories plus a lifecycle controller over them.
pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub result_dir: PathBuf,
    pub generator: Arc<StubGenerator>,
    pub lifecycle: Lifecycle,
}

impl TestHarness {
    pub fn new(generator: Arc<StubGenerator>) -> Self {
        Self::with_limit(generator, 10 * 1024 * 1024)
    }

    pub fn with_limit(generator: Arc<StubGenerator>, max_upload_bytes: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        let result_dir = temp_dir.path().join("downloads");

        let storage = ArtifactStorage::new(&upload_dir, &result_dir);
        storage
            .ensure_directories()
            .expect("Failed to create working directories");

        let lifecycle = Lifecycle::new(
            storage,
            Arc::new(ArtifactRegistry::new()),
            generator.clone(),
        )
        .with_max_upload_bytes(max_upload_bytes)
        .with_cleanup_delay(Duration::from_millis(50));

        Self {
            temp_dir,
            upload_dir,
            result_dir,
            generator,
            lifecycle,
        }
    }

    pub fn upload(name: &str, content_type: &str, data: &[u8], instructions: &str) -> Upload {
        Upload {
            file: Some(UploadedFile {
                file_name: name.to_string(),
                content_type: content_type.to_string(),
                data: data.to_vec(),
            }),
            instructions: Some(instructions.to_string()),
        }
    }

    pub fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("Failed to read directory")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn upload_files(&self) -> Vec<String> {
        Self::files_in(&self.upload_dir)
    }

    pub fn result_files(&self) -> Vec<String> {
        Self::files_in(&self.result_dir)
    }
}
