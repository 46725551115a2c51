//! HTTP server wiring: shared state, router and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use docchat_core::config::{ServerConfig, RESPONSE_HEAD_MARGIN};
use docchat_core::{AppError, AppResult};
use docchat_knowledge::RagPipeline;

use crate::handlers;

/// Shared application state.
pub struct AppState {
    /// The answer pipeline.
    pub pipeline: RagPipeline,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline }
    }
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    request_timeout: Duration,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a server for the given configuration and pipeline.
    ///
    /// # Errors
    /// Returns `AppError::Config` when the bind address does not parse.
    pub fn new(config: &ServerConfig, pipeline: RagPipeline) -> AppResult<Self> {
        let addr: SocketAddr = config.bind.parse().map_err(|e| {
            AppError::Config(format!("Invalid bind address '{}': {}", config.bind, e))
        })?;

        Ok(Self {
            addr,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            state: Arc::new(AppState::new(pipeline)),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.request_timeout)
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self) -> AppResult<()> {
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        tracing::info!(addr = %self.addr, "Starting docchat server");
        eprintln!(
            "\n\x1b[32m✓\x1b[0m Server listening on http://{}",
            self.addr
        );
        eprintln!("  Press Ctrl+C to stop\n");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Other(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        eprintln!("\x1b[32m✓\x1b[0m Server stopped");

        Ok(())
    }
}

/// Routes and middleware around shared state.
///
/// The timeout covers producing the response head; a streamed body may
/// outlive it. It never drops below the embedding retry budget plus
/// `RESPONSE_HEAD_MARGIN`, so an unavailable embedding service still gets
/// its warm-up response.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let floor = state.pipeline.embedding_budget() + RESPONSE_HEAD_MARGIN;
    let request_timeout = if request_timeout < floor {
        tracing::warn!(
            "Request timeout {:?} is below the embedding retry budget, using {:?}",
            request_timeout,
            floor
        );
        floor
    } else {
        request_timeout
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received SIGTERM, shutting down gracefully...");
        },
    }
}
