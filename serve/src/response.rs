//! Building and sending `ServerResponse`s over the WebSocket.

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use seolens::protocol::{PendingResponse, ResultResponse};
use seolens::{render, ErrorResponse, ServerResponse, SubmitOutcome};

/// Sent in place of a response that failed to serialize.
const SERIALIZATION_ERROR: &str =
    r#"{"type":"error","kind":"parse","error":"serialization error"}"#;

/// Serializes `response` and sends it as one text frame.
pub(crate) async fn send_response<S>(
    sink: &mut S,
    response: &ServerResponse,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(response).unwrap_or_else(|e| {
        tracing::warn!("serialize response: {}", e);
        SERIALIZATION_ERROR.to_string()
    });
    sink.send(Message::Text(json)).await?;
    Ok(())
}

pub(crate) fn pending(id: String, submission: &seolens::Submission) -> ServerResponse {
    ServerResponse::Pending(PendingResponse {
        id,
        operation: submission.operation(),
    })
}

/// Response for a finished submission; `None` when it was superseded by a reset.
pub(crate) fn outcome_response(id: String, outcome: SubmitOutcome) -> Option<ServerResponse> {
    match outcome {
        SubmitOutcome::Succeeded(done) => Some(ServerResponse::Result(ResultResponse {
            id,
            operation: done.operation,
            view: render(done.operation, &done.output),
            output: done.output,
        })),
        SubmitOutcome::Failed(message) => Some(ServerResponse::Error(ErrorResponse::new(
            Some(id),
            seolens::ErrorKind::Upstream,
            message,
        ))),
        SubmitOutcome::Rejected(rejection) => Some(ServerResponse::Error(
            ErrorResponse::from_rejection(Some(id), &rejection),
        )),
        SubmitOutcome::Superseded => None,
    }
}
