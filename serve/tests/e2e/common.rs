//! Shared helpers for e2e tests. Received responses are logged with `[e2e] received: ...`.
//! Run tests with `--nocapture` to see them.

use futures_util::{SinkExt, StreamExt};
use seolens::{ClientRequest, MockLlm, Pipeline, ServerResponse};
use serve::ServeConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

pub const CONTENT: &str =
    "Handmade olive-oil soap from Porto, cured for six weeks and cut by hand in small batches.";

/// Bind to a random port and spawn the server in once mode over `llm`.
/// Returns (ws_url, server_handle).
pub async fn spawn_server_once(
    llm: Arc<MockLlm>,
) -> (
    String,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{}/ws", addr);
    let pipeline = Pipeline::with_llm(llm);
    let server_handle = tokio::spawn(serve::run_serve_on_listener(
        listener,
        pipeline,
        ServeConfig::default(),
        true,
    ));
    (url, server_handle)
}

/// Sends `req` as JSON text.
pub async fn send<W>(write: &mut W, req: &ClientRequest) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(req)?;
    write.send(Message::Text(json)).await?;
    Ok(())
}

/// Reads the next text message. Returns the parsed response and the raw JSON.
pub async fn recv<R>(read: &mut R) -> Result<(ServerResponse, String), Box<dyn std::error::Error + Send + Sync>>
where
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let read_timeout = Duration::from_secs(10);
    loop {
        let opt = timeout(read_timeout, read.next()).await.map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout waiting for response")
        })?;
        let msg = opt
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no message"))??;
        if !msg.is_text() {
            continue;
        }
        let text = msg
            .to_text()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let received = text.to_string();
        eprintln!("[e2e] received: {}", received);
        let resp: ServerResponse = serde_json::from_str(text)?;
        return Ok((resp, received));
    }
}

/// Sends `req` and returns the first response.
pub async fn send_and_recv<W, R>(
    write: &mut W,
    read: &mut R,
    req: &ClientRequest,
) -> Result<(ServerResponse, String), Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    send(write, req).await?;
    recv(read).await
}
