//! JSON API: `POST /api/analyze` and `GET /api/operations`.
//!
//! Each analyze request runs through a fresh form controller, so the same local bounds apply
//! as in the page and WebSocket session.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seolens::{
    render, AnalyzeBody, AnalyzeResponse, ErrorKind, ErrorResponse, FormController, Operation,
    OperationInfo, Rejection, SubmitOutcome,
};
use std::sync::Arc;
use tracing::debug;

use super::app::AppState;

fn error(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Parses an operation field; empty means "not selected".
pub(crate) fn parse_operation(raw: &str) -> Result<Option<Operation>, seolens::UnsupportedOperationError> {
    match raw.trim() {
        "" => Ok(None),
        name => name.parse().map(Some),
    }
}

pub(crate) async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            return error(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(None, ErrorKind::Parse, e.body_text()),
            )
        }
    };
    let operation = match parse_operation(&body.operation) {
        Ok(op) => op,
        Err(e) => {
            return error(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(None, ErrorKind::Unsupported, e.to_string()),
            )
        }
    };

    let form = FormController::with_bounds(state.pipeline.clone(), state.config.bounds);
    match form.submit(operation, &body.content).await {
        SubmitOutcome::Succeeded(done) => {
            debug!(operation = %done.operation, "analyze ok");
            Json(AnalyzeResponse {
                operation: done.operation,
                view: render(done.operation, &done.output),
                output: done.output,
            })
            .into_response()
        }
        SubmitOutcome::Rejected(Rejection::Invalid(e)) => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse::validation(None, &e),
        ),
        SubmitOutcome::Failed(message) => error(
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new(None, ErrorKind::Upstream, message),
        ),
        SubmitOutcome::Rejected(Rejection::Busy) | SubmitOutcome::Superseded => error(
            StatusCode::CONFLICT,
            ErrorResponse::busy(None),
        ),
    }
}

pub(crate) async fn operations() -> Json<Vec<OperationInfo>> {
    Json(OperationInfo::all())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_operation_treats_blank_as_unselected() {
        assert_eq!(parse_operation("  ").unwrap(), None);
        assert_eq!(parse_operation("faq").unwrap(), Some(Operation::FaqGeneration));
        assert!(parse_operation("keywords").is_err());
    }
}
