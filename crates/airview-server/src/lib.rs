// HTTP front end
//
// Read-only views over the post cache and the view tracker:
// - GET /                  most viewed authors
// - GET /goto?address=A    redirect to /view/A
// - GET /view/:alias       live fetch of an author's posts (records a view)
// - GET /view/:alias/*name single cached post
// - GET /health, /ready    probes
//
// Responses are JSON. Requests are traced and the server shuts down
// gracefully on Ctrl+C / SIGTERM.

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use airview_config::RuntimeConfig;
use airview_core::ViewTracker;
use airview_fetch::PostFetcher;

mod handlers;
mod init;

use handlers::{goto, health_check, home, ready_check, view_post, view_user};
pub use init::init_tracing;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<PostFetcher>,
    pub tracker: Arc<ViewTracker>,
    /// Number of ranking slots shown on the home page
    pub home_top: usize,
}

impl AppState {
    pub fn new(fetcher: Arc<PostFetcher>, tracker: Arc<ViewTracker>, home_top: usize) -> Self {
        Self {
            fetcher,
            tracker,
            home_top,
        }
    }

    /// Wire the directory, fetcher, cache and tracker described by `config`.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        init::init_state(config)
    }
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request error: {:?}", self.error);
        } else {
            debug!(status = %self.status, "Request rejected: {}", self.error);
        }

        (
            self.status,
            Json(json!({
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!(message))
    }
}

/// Routes plus request tracing, bound to `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/goto", get(goto))
        .route("/view/:alias", get(view_user))
        .route("/view/:alias/*name", get(view_post))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Serve `router` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")
}

/// Entry point with a fully resolved configuration
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config.server);

    let state = AppState::from_config(&config)?;
    let addr = config.server.listen_addr.clone();

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("airview listening on http://{}", addr);
    info!("Routes:");
    info!("  GET http://{}/                   - Most viewed authors", addr);
    info!("  GET http://{}/goto?address=ALIAS - Jump to an author", addr);
    info!("  GET http://{}/view/ALIAS         - Author's posts", addr);
    info!("  GET http://{}/view/ALIAS/NAME    - Single cached post", addr);
    info!("  GET http://{}/health             - Health check", addr);
    info!("  GET http://{}/ready              - Readiness check", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    serve(listener, build_router(state), shutdown_signal()).await?;

    info!("Server shutdown complete");

    Ok(())
}
