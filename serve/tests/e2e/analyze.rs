use futures_util::StreamExt;
use seolens::protocol::{AnalyzeRequest, ResetRequest};
use seolens::{ClientRequest, ErrorKind, MockLlm, Operation, ServerResponse, View};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

use super::common;

fn analyze(id: &str, operation: Option<&str>, content: &str) -> ClientRequest {
    ClientRequest::Analyze(AnalyzeRequest {
        id: id.to_string(),
        operation: operation.map(str::to_string),
        content: content.to_string(),
    })
}

#[tokio::test]
async fn e2e_analyze_faq_sends_pending_then_result() {
    let llm = Arc::new(MockLlm::with_reply(json!({
        "faqs": [
            { "question": "Q1", "answer": "A1" },
            { "question": "Q2", "answer": "A2" }
        ]
    })));
    let (url, server_handle) = common::spawn_server_once(llm.clone()).await;
    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let (first, _) = common::send_and_recv(
        &mut write,
        &mut read,
        &analyze("a-1", Some("faq"), common::CONTENT),
    )
    .await
    .unwrap();
    match &first {
        ServerResponse::Pending(p) => {
            assert_eq!(p.id, "a-1");
            assert_eq!(p.operation, Operation::FaqGeneration);
        }
        _ => panic!("expected Pending, got {:?}", first),
    }

    let (second, received) = common::recv(&mut read).await.unwrap();
    assert!(received.contains("\"kind\":\"disclosures\""), "{}", received);
    match &second {
        ServerResponse::Result(r) => {
            assert_eq!(r.id, "a-1");
            match &r.view {
                View::Disclosures { items } => {
                    let summaries: Vec<_> = items.iter().map(|i| i.summary.as_str()).collect();
                    assert_eq!(summaries, ["Q1", "Q2"]);
                }
                other => panic!("expected disclosures, got {:?}", other),
            }
        }
        _ => panic!("expected Result, got {:?}", second),
    }
    assert_eq!(llm.call_count(), 1);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

#[tokio::test]
async fn e2e_short_content_is_rejected_without_model_call() {
    let llm = Arc::new(MockLlm::sample_replies());
    let (url, server_handle) = common::spawn_server_once(llm.clone()).await;
    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let (resp, _) = common::send_and_recv(&mut write, &mut read, &analyze("a-2", Some("audit"), "too short"))
        .await
        .unwrap();
    match &resp {
        ServerResponse::Error(e) => {
            assert_eq!(e.kind, ErrorKind::Validation);
            assert_eq!(e.field.as_deref(), Some("content"));
            assert_eq!(e.id.as_deref(), Some("a-2"));
        }
        _ => panic!("expected validation Error, got {:?}", resp),
    }
    assert_eq!(llm.call_count(), 0);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

#[tokio::test]
async fn e2e_unknown_operation_is_unsupported() {
    let (url, server_handle) = common::spawn_server_once(Arc::new(MockLlm::sample_replies())).await;
    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let (resp, _) = common::send_and_recv(
        &mut write,
        &mut read,
        &analyze("a-3", Some("keywords"), common::CONTENT),
    )
    .await
    .unwrap();
    match &resp {
        ServerResponse::Error(e) => assert_eq!(e.kind, ErrorKind::Unsupported),
        _ => panic!("expected Unsupported, got {:?}", resp),
    }

    let (resp, _) = common::send_and_recv(
        &mut write,
        &mut read,
        &ClientRequest::Reset(ResetRequest { id: "r-1".into() }),
    )
    .await
    .unwrap();
    assert!(matches!(resp, ServerResponse::Reset(ref r) if r.id == "r-1"));

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
