//! Shared state handed to every route.

use std::sync::Arc;

use contentlens::Lifecycle;

/// Multipart framing and the instructions field on top of the file itself.
pub const MULTIPART_SLACK_BYTES: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<Lifecycle>,
}

impl AppState {
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Request body ceiling: the upload limit plus multipart slack.
    pub fn body_limit(&self) -> usize {
        let limit = self
            .lifecycle
            .max_upload_bytes()
            .saturating_add(MULTIPART_SLACK_BYTES);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}
