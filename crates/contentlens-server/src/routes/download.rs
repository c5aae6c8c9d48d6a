use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use tokio::io::AsyncReadExt;

use contentlens::ServedArtifact;

use crate::error::AppError;
use crate::state::AppState;

const CHUNK_SIZE: usize = 16 * 1024;

/// `GET /download/:id`
///
/// The served-file guard travels inside the body stream, so the copy is
/// deleted only after the body finishes or the client goes away.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let served = state.lifecycle.download(&id).await?;
    let file = served.open().await?;
    let disposition = content_disposition(served.download_name());

    let body = stream::try_unfold(
        (file, served),
        |(mut file, served): (tokio::fs::File, ServedArtifact)| async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            buf.truncate(read);
            Ok::<_, std::io::Error>(Some((Bytes::from(buf), (file, served))))
        },
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

/// Builds an attachment header with an ASCII fallback name and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
