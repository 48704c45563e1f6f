//! End-to-end WebSocket tests: each test binds 127.0.0.1:0, spawns the server in once mode
//! over a mock pipeline, and talks to `/ws` with tokio-tungstenite.

mod analyze;
mod busy;
mod common;
mod invalid_json;
mod ping;
