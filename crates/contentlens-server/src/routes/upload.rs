use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::response::{Html, Redirect};

use contentlens::processor::media_type::OCTET_STREAM;
use contentlens::{Upload, UploadedFile};

use crate::error::AppError;
use crate::pages::{index_page, result_page};
use crate::state::AppState;

pub const DOCUMENT_FIELD: &str = "document";
pub const INSTRUCTIONS_FIELD: &str = "instructions";

/// `GET /`: loading the form starts a fresh session, so pending results are purged.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    state.lifecycle.purge_all().await;
    Html(index_page(state.lifecycle.max_upload_bytes()))
}

/// `GET /process-another`
pub async fn process_another(State(state): State<AppState>) -> Redirect {
    state.lifecycle.purge_all().await;
    Redirect::to("/")
}

/// `GET /upload` has nothing to show.
pub async fn upload_redirect() -> Redirect {
    Redirect::to("/")
}

/// `POST /upload`
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, AppError> {
    let upload = read_upload(multipart?).await?;
    let processed = state.lifecycle.process_upload(upload).await?;
    Ok(Html(result_page(&processed)))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(DOCUMENT_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .filter(|t| !t.is_empty())
                    .unwrap_or(OCTET_STREAM)
                    .to_string();
                let data = field.bytes().await?;

                upload.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            Some(INSTRUCTIONS_FIELD) => {
                upload.instructions = Some(field.text().await?);
            }
            _ => {}
        }
    }

    Ok(upload)
}
