//! One-shot analysis: read content, submit once, return the rendered result.

use std::path::Path;

use seolens::{
    render, AnalyzeResponse, ContentBounds, FormController, Operation, Pipeline, Rejection,
    SubmitOutcome, ValidationError,
};
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Failure of one CLI run. Every variant exits with code 1.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Validation(ValidationError),
    #[error("{0}")]
    Upstream(String),
    #[error("read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("submission did not complete")]
    Interrupted,
}

/// Content from `file`, else the joined positional `text`, else stdin.
///
/// `-` as the file name reads stdin.
pub async fn read_content(file: Option<&Path>, text: &[String]) -> Result<String, RunError> {
    match file {
        Some(path) if path != Path::new("-") => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RunError::Read {
                    path: path.display().to_string(),
                    source,
                })
        }
        Some(_) => read_stdin().await,
        None if !text.is_empty() => Ok(text.join(" ")),
        None => read_stdin().await,
    }
}

async fn read_stdin() -> Result<String, RunError> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(|source| RunError::Read {
            path: "<stdin>".to_string(),
            source,
        })?;
    Ok(buf)
}

/// Submits `content` once and returns the validated output with its view.
pub async fn run_once(
    pipeline: Pipeline,
    bounds: ContentBounds,
    operation: Operation,
    content: &str,
) -> Result<AnalyzeResponse, RunError> {
    let form = FormController::with_bounds(pipeline, bounds);
    match form.submit(Some(operation), content).await {
        SubmitOutcome::Succeeded(done) => Ok(AnalyzeResponse {
            operation: done.operation,
            view: render(done.operation, &done.output),
            output: done.output,
        }),
        SubmitOutcome::Rejected(Rejection::Invalid(e)) => Err(RunError::Validation(e)),
        SubmitOutcome::Failed(message) => Err(RunError::Upstream(message)),
        SubmitOutcome::Rejected(Rejection::Busy) | SubmitOutcome::Superseded => {
            Err(RunError::Interrupted)
        }
    }
}
