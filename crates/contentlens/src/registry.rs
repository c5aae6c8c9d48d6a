//! In-memory index of generated results awaiting download.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

/// A generated answer waiting to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifact {
    /// Location of the persisted markdown result.
    pub result_path: PathBuf,
    /// Filename of the upload the result was generated from.
    pub original_name: String,
    pub registered_at: DateTime<Utc>,
}

impl ResultArtifact {
    /// Filename offered to the browser when the result is downloaded.
    pub fn download_name(&self) -> String {
        format!("{}_result.md", self.original_name)
    }
}

/// Maps document identifiers to their result files.
///
/// An entry is reachable only while its result file exists. The registry never
/// touches the filesystem itself: callers delete files for the entries they
/// evict or sweep, and because removal hands back the entry, each file has
/// exactly one owner responsible for deleting it.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    entries: Mutex<HashMap<String, ResultArtifact>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ResultArtifact>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Artifact registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Inserts or overwrites the entry for `id`. The result file must already exist.
    pub fn register(
        &self,
        id: impl Into<String>,
        result_path: PathBuf,
        original_name: impl Into<String>,
    ) {
        debug_assert!(result_path.exists(), "registering a missing result file");

        let id = id.into();
        let artifact = ResultArtifact {
            result_path,
            original_name: original_name.into(),
            registered_at: Utc::now(),
        };

        if self.entries().insert(id.clone(), artifact).is_some() {
            log::warn!("Replaced existing registry entry for {}", id);
        }
    }

    pub fn lookup(&self, id: &str) -> Option<ResultArtifact> {
        self.entries().get(id).cloned()
    }

    /// Removes the entry. Whoever receives `Some` owns the result file.
    pub fn evict(&self, id: &str) -> Option<ResultArtifact> {
        self.entries().remove(id)
    }

    /// Drains every entry in one critical section.
    pub fn sweep_all(&self) -> Vec<(String, ResultArtifact)> {
        self.entries().drain().collect()
    }

    /// Drains the entries registered strictly before `cutoff`.
    pub fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Vec<(String, ResultArtifact)> {
        let mut entries = self.entries();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, artifact)| artifact.registered_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|artifact| (id, artifact)))
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
