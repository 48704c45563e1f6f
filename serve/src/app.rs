//! Axum app: configuration, shared state, and the router.
//!
//! Routes:
//! - `GET /` form page; `POST /` form submission (see [`crate::page`])
//! - `POST /api/analyze`, `GET /api/operations` (see [`crate::api`])
//! - `GET /ws` WebSocket session, one form controller per connection (see [`handle_socket`])
//! - `GET /health`

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::{get, post},
    Router,
};
use seolens::{ContentBounds, Pipeline};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::api::{analyze, operations};
use super::connection::handle_socket;
use super::page::{index, submit_form};

/// Default listen address when `SERVE_ADDR` is not set.
pub const DEFAULT_ADDR: &str = "127.0.0.1:9002";

/// Server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeConfig {
    /// Listen address.
    pub addr: String,
    /// Max responses buffered between a connection's submission tasks and its socket writer.
    pub event_queue_capacity: usize,
    /// Character bounds applied by every form controller the server creates.
    pub bounds: ContentBounds,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            event_queue_capacity: 32,
            bounds: ContentBounds::default(),
        }
    }
}

impl ServeConfig {
    /// Builds the config from environment variables, falling back to [`Default`] for unset or
    /// invalid values.
    ///
    /// - `SERVE_ADDR` (default 127.0.0.1:9002)
    /// - `SERVE_EVENT_QUEUE_CAPACITY` (default 32)
    /// - `FORM_MIN_CONTENT_CHARS`, `FORM_MAX_CONTENT_CHARS` (see [`ContentBounds::from_env`])
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            addr: std::env::var("SERVE_ADDR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default.addr),
            event_queue_capacity: std::env::var("SERVE_EVENT_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default.event_queue_capacity),
            bounds: ContentBounds::from_env(),
        }
    }
}

/// Shared state for all routes.
///
/// The pipeline is shared by every request; form controllers are created per request
/// (HTTP) or per connection (WebSocket).
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: Pipeline,
    pub(crate) config: ServeConfig,
    /// When set, the first WebSocket connection to close sends on this to stop the server
    /// (once mode, used by tests).
    pub(crate) shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub(crate) fn new(pipeline: Pipeline, config: ServeConfig) -> Self {
        Self {
            pipeline,
            config,
            shutdown_tx: Arc::new(Mutex::new(None)),
        }
    }
}

/// Builds the Axum router.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/analyze", post(analyze))
        .route("/api/operations", get(operations))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Handles `GET /ws`: upgrades and delegates to [`handle_socket`].
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let shutdown_tx = state.shutdown_tx.lock().ok().and_then(|mut g| g.take());
    ws.on_upgrade(move |socket| handle_socket(socket, state, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_listens_on_local_port() {
        let config = ServeConfig::default();
        assert_eq!(config.addr, "127.0.0.1:9002");
        assert_eq!(config.bounds, ContentBounds::default());
    }

    #[test]
    fn from_env_reads_addr_and_ignores_invalid_capacity() {
        let prev_addr = std::env::var("SERVE_ADDR").ok();
        let prev_cap = std::env::var("SERVE_EVENT_QUEUE_CAPACITY").ok();
        std::env::set_var("SERVE_ADDR", "0.0.0.0:8088");
        std::env::set_var("SERVE_EVENT_QUEUE_CAPACITY", "zero");
        let config = ServeConfig::from_env();
        for (key, prev) in [
            ("SERVE_ADDR", prev_addr),
            ("SERVE_EVENT_QUEUE_CAPACITY", prev_cap),
        ] {
            match prev {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        assert_eq!(config.addr, "0.0.0.0:8088");
        assert_eq!(config.event_queue_capacity, 32);
    }
}
