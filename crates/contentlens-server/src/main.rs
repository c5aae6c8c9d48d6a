use std::process::ExitCode;
use std::sync::Arc;

use log::info;
use tokio::net::TcpListener;

use contentlens::logging::init_tracing;
use contentlens::{spawn_retention_sweeper, ContentLensError, GeminiClient, Lifecycle};
use contentlens_server::{build_router, AppState};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    ContentLens(#[from] ContentLensError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ContentLens stopped");
            eprintln!("contentlens: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = contentlens::load_from_env().map_err(ContentLensError::from)?;
    init_tracing(&config.logging).map_err(ContentLensError::from)?;

    info!("Starting ContentLens v{}", env!("CARGO_PKG_VERSION"));

    // A missing API key is fatal; the service is useless without it.
    let generator = GeminiClient::from_config(&config.generation)?;
    tracing::info!(model = generator.model(), "Generation client ready");

    let lifecycle = Lifecycle::from_config(&config, Arc::new(generator));
    lifecycle
        .storage()
        .ensure_directories()
        .map_err(ContentLensError::from)?;
    let lifecycle = Arc::new(lifecycle);

    let sweeper = spawn_retention_sweeper(Arc::clone(&lifecycle), &config.retention);
    let app = build_router(AppState::new(Arc::clone(&lifecycle)));

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    // Results are only reachable through the in-memory registry.
    let report = lifecycle.purge_all().await;
    info!(
        "Shutdown complete, {} pending result(s) removed",
        report.files_removed
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
