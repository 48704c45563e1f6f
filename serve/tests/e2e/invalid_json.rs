use futures_util::{SinkExt, StreamExt};
use seolens::{ErrorKind, MockLlm, ServerResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common;

#[tokio::test]
async fn e2e_invalid_json_returns_error() {
    let llm = Arc::new(MockLlm::sample_replies());
    let (url, server_handle) = common::spawn_server_once(llm.clone()).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text("not valid json".to_string()))
        .await
        .unwrap();
    let (resp, received) = common::recv(&mut read).await.unwrap();

    assert!(
        received.contains("\"type\":\"error\"") && received.contains("parse"),
        "expected error for invalid JSON, received: {}",
        received
    );
    match &resp {
        ServerResponse::Error(e) => {
            assert_eq!(e.kind, ErrorKind::Parse);
            assert!(e.id.is_none());
        }
        _ => panic!("expected Error for invalid JSON, got {:?}", resp),
    }
    assert_eq!(llm.call_count(), 0);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
