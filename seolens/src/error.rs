//! Error types shared by the schema layer, the dispatch pipeline and the form controller.

use thiserror::Error;

use crate::llm::LlmError;

/// Message used when the model reply is absent or does not satisfy the output shape.
pub const NO_STRUCTURED_OUTPUT: &str = "no structured output returned";

/// A value failed a structural shape check.
///
/// `field` is the offending field path (e.g. `content`, `faqs[1].answer`); `constraint`
/// is the failed rule in words (e.g. `is required`). Always recoverable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field}: {constraint}")]
pub struct ValidationError {
    pub field: String,
    pub constraint: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

/// Operation name outside the closed set. Only produced when parsing names from the
/// outside world; surfaces render it as a placeholder rather than failing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported operation: {0}")]
pub struct UnsupportedOperationError(pub String);

/// Failure of one pipeline execution.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Input failed its shape check before any external call was made.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The external generation call failed, or returned no usable structured reply.
    #[error("{0}")]
    Upstream(String),
}

impl PipelineError {
    /// Upstream failure for an absent or malformed reply.
    pub fn no_structured_output() -> Self {
        PipelineError::Upstream(NO_STRUCTURED_OUTPUT.to_string())
    }
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        PipelineError::Upstream(e.to_string())
    }
}
