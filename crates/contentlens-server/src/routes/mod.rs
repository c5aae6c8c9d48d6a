pub mod download;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(upload::index))
        .route("/upload", get(upload::upload_redirect).post(upload::upload))
        .route("/download/:id", get(download::download))
        .route("/process-another", get(upload::process_another))
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { AppError::PageNotFound })
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(trace_layer)
        .with_state(state)
}
