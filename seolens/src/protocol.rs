//! # Protocol module
//!
//! Wire types shared by the server and its clients.
//!
//! - **WebSocket** (`GET /ws`): [`ClientRequest`] in, [`ServerResponse`] out, one JSON object
//!   per text frame with `"type": "<variant_name>"`.
//! - **HTTP API** (`POST /api/analyze`, `GET /api/operations`): [`AnalyzeBody`] in,
//!   [`AnalyzeResponse`] or [`ErrorResponse`] out.
//!
//! Operation names arrive as plain strings so an unknown name can be answered with an
//! `unsupported` error instead of a parse failure.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::form::Rejection;
use crate::operation::Operation;
use crate::render::View;
use crate::schema::Output;

// -----------------------------------------------------------------------------
// Requests (client → server)
// -----------------------------------------------------------------------------

/// Analyze request: one submission through the connection's form controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub content: String,
}

/// Reset request: clear the form; an in-flight submission is superseded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetRequest {
    pub id: String,
}

/// Ping request: health / keepalive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingRequest {
    pub id: String,
}

/// Client-to-server request envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Analyze(AnalyzeRequest),
    Reset(ResetRequest),
    Ping(PingRequest),
}

// -----------------------------------------------------------------------------
// Responses (server → client)
// -----------------------------------------------------------------------------

/// Sent when a submission is accepted and the form is pending.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub id: String,
    pub operation: Operation,
}

/// Final result of one submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub id: String,
    pub operation: Operation,
    pub output: Output,
    pub view: View,
}

/// Acknowledges a reset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub id: String,
}

/// Pong: response to ping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongResponse {
    pub id: String,
}

/// Error category, so clients can tell a field message from a banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A submission is already pending.
    Busy,
    /// Local validation failed; `field` names the input.
    Validation,
    /// The external call failed or returned no usable result.
    Upstream,
    /// Operation name outside the closed set.
    Unsupported,
    /// The request could not be parsed.
    Parse,
}

/// Error response for any failed request (WebSocket and HTTP).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: ErrorKind,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(id: Option<String>, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            error: error.into(),
            field: None,
        }
    }

    pub fn validation(id: Option<String>, e: &ValidationError) -> Self {
        Self {
            id,
            kind: ErrorKind::Validation,
            error: e.constraint.clone(),
            field: Some(e.field.clone()),
        }
    }

    pub fn busy(id: Option<String>) -> Self {
        Self::new(id, ErrorKind::Busy, "a submission is already pending")
    }

    pub fn from_rejection(id: Option<String>, rejection: &Rejection) -> Self {
        match rejection {
            Rejection::Busy => Self::busy(id),
            Rejection::Invalid(e) => Self::validation(id, e),
        }
    }
}

/// Server-to-client response envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    Pending(PendingResponse),
    Result(ResultResponse),
    Reset(ResetResponse),
    Pong(PongResponse),
    Error(ErrorResponse),
}

// -----------------------------------------------------------------------------
// HTTP API
// -----------------------------------------------------------------------------

/// `POST /api/analyze` body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzeBody {
    pub operation: String,
    pub content: String,
}

/// `POST /api/analyze` success body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub operation: Operation,
    pub output: Output,
    pub view: View,
}

/// One entry of `GET /api/operations`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub value: Operation,
    pub label: String,
}

impl OperationInfo {
    /// All operations in selector order.
    pub fn all() -> Vec<OperationInfo> {
        Operation::ALL
            .iter()
            .map(|op| OperationInfo {
                value: *op,
                label: op.label().to_string(),
            })
            .collect()
    }
}
