use futures_util::StreamExt;
use seolens::protocol::AnalyzeRequest;
use seolens::{ClientRequest, ErrorKind, MockLlm, ServerResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

use super::common;

#[tokio::test]
async fn e2e_second_submit_while_pending_is_busy() {
    let llm = Arc::new(MockLlm::sample_replies().with_delay(Duration::from_millis(300)));
    let (url, server_handle) = common::spawn_server_once(llm.clone()).await;
    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = |id: &str| {
        ClientRequest::Analyze(AnalyzeRequest {
            id: id.to_string(),
            operation: Some("rewrite".into()),
            content: common::CONTENT.to_string(),
        })
    };

    let (first, _) = common::send_and_recv(&mut write, &mut read, &req("b-1")).await.unwrap();
    assert!(matches!(first, ServerResponse::Pending(_)), "{:?}", first);

    let (second, _) = common::send_and_recv(&mut write, &mut read, &req("b-2")).await.unwrap();
    match &second {
        ServerResponse::Error(e) => {
            assert_eq!(e.kind, ErrorKind::Busy);
            assert_eq!(e.id.as_deref(), Some("b-2"));
        }
        _ => panic!("expected Busy, got {:?}", second),
    }

    let (done, _) = common::recv(&mut read).await.unwrap();
    assert!(matches!(done, ServerResponse::Result(ref r) if r.id == "b-1"), "{:?}", done);
    assert_eq!(llm.call_count(), 1);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
