//! HTTP and WebSocket server for SeoLens (axum + ws).
//!
//! Serves the form page at `/`, a JSON API under `/api`, and a WebSocket session at `/ws`
//! that drives one form controller per connection.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`app`], [`ServeConfig`].

mod api;
mod app;
mod connection;
mod page;
mod response;

use axum::Router;
use seolens::Pipeline;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use app::{router, AppState};

pub use app::{ServeConfig, DEFAULT_ADDR};

/// Router over `pipeline` without once-mode shutdown. Used by in-process router tests.
pub fn app(pipeline: Pipeline, config: ServeConfig) -> Router {
    router(Arc::new(AppState::new(pipeline, config)))
}

/// Runs the server on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass listener).
/// When `once` is true, the server stops after the first WebSocket connection closes.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    pipeline: Pipeline,
    config: ServeConfig,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("SeoLens listening on http://{} (ws at /ws)", addr);
    if once {
        info!("will exit after first connection is done (once mode, used by tests)");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = AppState::new(pipeline, config);
    if once {
        if let Ok(mut slot) = state.shutdown_tx.lock() {
            *slot = Some(shutdown_tx);
        }
    }
    let app = router(Arc::new(state));

    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the server on `config.addr` with the pipeline built from the environment.
pub async fn run_serve(
    config: ServeConfig,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let pipeline = Pipeline::from_env()?;
    let listener = TcpListener::bind(&config.addr).await?;
    run_serve_on_listener(listener, pipeline, config, once).await
}
