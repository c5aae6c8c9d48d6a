use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use contentlens::LifecycleError;
use thiserror::Error;

use crate::pages::error_page;

/// Failures a route can hand back to the browser, rendered as an HTML page
/// with a link back to the upload form.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Could not read the upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("Could not read the upload: {}", .0.body_text())]
    Rejection(#[from] MultipartRejection),

    #[error("Page not found")]
    PageNotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Lifecycle(e) => match e {
                LifecycleError::MissingDocument | LifecycleError::MissingInstructions => {
                    StatusCode::BAD_REQUEST
                }
                LifecycleError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                LifecycleError::NotFound { .. } | LifecycleError::ResultMissing { .. } => {
                    StatusCode::NOT_FOUND
                }
                LifecycleError::Generation(_) => StatusCode::BAD_GATEWAY,
                LifecycleError::Storage(_) | LifecycleError::Extraction(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Multipart(e) => e.status(),
            Self::Rejection(e) => e.status(),
            Self::PageNotFound => StatusCode::NOT_FOUND,
        }
    }

    fn title(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::PAYLOAD_TOO_LARGE => "File too large",
            status if status.is_client_error() => "Invalid request",
            _ => "Error processing document",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Html(error_page(self.title(), &self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentlens::GenerationError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LifecycleError::MissingDocument, StatusCode::BAD_REQUEST),
            (LifecycleError::MissingInstructions, StatusCode::BAD_REQUEST),
            (
                LifecycleError::FileTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                LifecycleError::NotFound { id: "x".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                LifecycleError::Generation(GenerationError::EmptyResponse("no candidates".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LifecycleError::Extraction("panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }
}
