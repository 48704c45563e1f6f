//! WebSocket connection lifecycle: one form controller per connection, a recv loop that
//! dispatches requests, and a writer task that owns the socket's send half.
//!
//! Submissions run on their own task so `reset` and `ping` are answered while a call is in
//! flight; every response goes through one bounded queue to the writer.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use seolens::protocol::{PongResponse, ResetResponse};
use seolens::{ClientRequest, ErrorKind, ErrorResponse, FormController, Operation, ServerResponse};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::app::AppState;
use super::response::{outcome_response, pending, send_response};

type Outbox = mpsc::Sender<ServerResponse>;
type SendError = mpsc::error::SendError<ServerResponse>;

pub(crate) async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
) {
    let session = format!("ws-{}", Uuid::new_v4());
    let span = info_span!("session", id = %session);
    let form = FormController::with_bounds(state.pipeline.clone(), state.config.bounds);
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerResponse>(state.config.event_queue_capacity);

    let writer = tokio::spawn(
        async move {
            while let Some(resp) = rx.recv().await {
                if let Err(e) = send_response(&mut sink, &resp).await {
                    warn!("send error (client closed?): {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        }
        .instrument(span.clone()),
    );

    async {
        info!("connection opened");
        while let Some(res) = stream.next().await {
            let msg = match res {
                Ok(m) => m,
                Err(e) => {
                    warn!("read error (client closed?): {}", e);
                    break;
                }
            };
            let text = match msg {
                Message::Text(t) => t,
                Message::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
                Message::Close(_) => break,
                _ => continue,
            };
            if let Err(e) = handle_request(&text, &form, &tx).await {
                warn!("writer gone: {}", e);
                break;
            }
        }
        info!("connection closed");
    }
    .instrument(span)
    .await;

    form.reset();
    drop(tx);
    writer.abort();
    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}

/// Parses one client message and queues the response(s).
async fn handle_request(text: &str, form: &FormController, tx: &Outbox) -> Result<(), SendError> {
    let req: ClientRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            let resp = ErrorResponse::new(None, ErrorKind::Parse, format!("parse error: {}", e));
            return tx.send(ServerResponse::Error(resp)).await;
        }
    };

    match req {
        ClientRequest::Analyze(r) => {
            let operation = match r.operation.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(name) => match name.parse::<Operation>() {
                    Ok(op) => Some(op),
                    Err(e) => {
                        let resp = ErrorResponse::new(Some(r.id), ErrorKind::Unsupported, e.to_string());
                        return tx.send(ServerResponse::Error(resp)).await;
                    }
                },
            };
            match form.begin(operation, &r.content) {
                Err(rejection) => {
                    let resp = ErrorResponse::from_rejection(Some(r.id), &rejection);
                    tx.send(ServerResponse::Error(resp)).await?;
                }
                Ok(submission) => {
                    tx.send(pending(r.id.clone(), &submission)).await?;
                    let tx = tx.clone();
                    let id = r.id;
                    tokio::spawn(
                        async move {
                            let outcome = submission.run().await;
                            match outcome_response(id, outcome) {
                                Some(resp) => {
                                    let _ = tx.send(resp).await;
                                }
                                None => debug!("superseded submission dropped"),
                            }
                        }
                        .in_current_span(),
                    );
                }
            }
        }
        ClientRequest::Reset(r) => {
            form.reset();
            tx.send(ServerResponse::Reset(ResetResponse { id: r.id })).await?;
        }
        ClientRequest::Ping(r) => {
            tx.send(ServerResponse::Pong(PongResponse { id: r.id })).await?;
        }
    }
    Ok(())
}
