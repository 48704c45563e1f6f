//! Form controller: the submission state machine behind the input form.
//!
//! ```text
//! Idle ──submit(valid)──▶ Pending ──ok──▶ Succeeded ──submit──▶ Pending …
//!                            └────err──▶ Failed    ──submit──▶ Pending …
//! reset() from any phase ──▶ Idle        dismiss_error() from Failed ──▶ Idle
//! ```
//!
//! Local validation runs before anything else; invalid input sets a field error and never
//! reaches the pipeline. At most one submission is pending per controller; a second submit
//! is rejected with [`Rejection::Busy`], not queued. The state lives behind a mutex that is
//! released before the pipeline call, so a clone of the controller can observe `Pending` or
//! call [`FormController::reset`] while a call is in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, ValidationError};
use crate::operation::Operation;
use crate::pipeline::Pipeline;
use crate::schema::Output;

/// Default minimum content length in characters.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;
/// Default maximum content length in characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 10_000;

/// Inclusive character bounds for submitted content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentBounds {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for ContentBounds {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CONTENT_CHARS,
            max_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

impl ContentBounds {
    /// Reads `FORM_MIN_CONTENT_CHARS` and `FORM_MAX_CONTENT_CHARS`. Unparseable values, or a
    /// minimum above the maximum, are logged and replaced by the defaults.
    pub fn from_env() -> Self {
        fn read(key: &str, default: usize) -> usize {
            match std::env::var(key) {
                Ok(s) => s.trim().parse().unwrap_or_else(|_| {
                    warn!(key, value = %s, "invalid content bound, using default");
                    default
                }),
                Err(_) => default,
            }
        }
        let bounds = Self {
            min_chars: read("FORM_MIN_CONTENT_CHARS", DEFAULT_MIN_CONTENT_CHARS),
            max_chars: read("FORM_MAX_CONTENT_CHARS", DEFAULT_MAX_CONTENT_CHARS),
        };
        if bounds.min_chars > bounds.max_chars {
            warn!(
                min = bounds.min_chars,
                max = bounds.max_chars,
                "content bounds inverted, using defaults"
            );
            return Self::default();
        }
        bounds
    }

    /// Checks `content` length (in characters) against the bounds.
    pub fn check(&self, content: &str) -> Result<(), ValidationError> {
        let chars = content.chars().count();
        if chars < self.min_chars {
            return Err(ValidationError::new(
                "content",
                format!("must be at least {} characters", self.min_chars),
            ));
        }
        if chars > self.max_chars {
            return Err(ValidationError::new(
                "content",
                format!("must not be longer than {} characters", self.max_chars),
            ));
        }
        Ok(())
    }
}

/// Phase of the form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// A finished result and the operation it was produced for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completed {
    pub operation: Operation,
    pub output: Output,
}

/// Snapshot of the form.
///
/// `result` is `Some` only in [`Phase::Succeeded`]; `error` only in [`Phase::Failed`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    /// Operation chosen by the last submit attempt.
    pub selected: Option<Operation>,
    /// Content of the last submit attempt, as typed.
    pub content: String,
    pub phase: Phase,
    pub result: Option<Completed>,
    pub error: Option<String>,
    /// Inline message for the offending field after a rejected submit.
    pub field_error: Option<ValidationError>,
    /// Incremented by every accepted submit and every reset.
    pub submission: u64,
}

impl FormState {
    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Pending
    }
}

/// Why a submit was not started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A submission is already pending.
    Busy,
    /// Local validation failed.
    Invalid(ValidationError),
}

/// Result of one [`FormController::submit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded(Completed),
    Failed(String),
    Rejected(Rejection),
    /// A reset happened while the call was in flight; its result was discarded.
    Superseded,
}

/// Submission state machine over a shared [`Pipeline`]. Clones share state.
#[derive(Clone)]
pub struct FormController {
    pipeline: Pipeline,
    bounds: ContentBounds,
    state: Arc<Mutex<FormState>>,
}

impl FormController {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::with_bounds(pipeline, ContentBounds::default())
    }

    pub fn with_bounds(pipeline: Pipeline, bounds: ContentBounds) -> Self {
        Self {
            pipeline,
            bounds,
            state: Arc::new(Mutex::new(FormState::default())),
        }
    }

    pub fn bounds(&self) -> ContentBounds {
        self.bounds
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current snapshot.
    pub fn state(&self) -> FormState {
        self.lock().clone()
    }

    /// False while a submission is pending (the trigger is disabled).
    pub fn can_submit(&self) -> bool {
        !self.lock().is_pending()
    }

    /// Validates locally and, when accepted, moves the form to `Pending`.
    ///
    /// `operation` is `None` when nothing is selected. On a validation failure the phase is
    /// left unchanged and `field_error` is set. Otherwise the previous result and error are
    /// cleared. The returned [`Submission`] must be run to complete the transition.
    pub fn begin(&self, operation: Option<Operation>, content: &str) -> Result<Submission, Rejection> {
        let mut state = self.lock();
        if state.is_pending() {
            debug!("submit rejected: busy");
            return Err(Rejection::Busy);
        }
        state.selected = operation;
        state.content = content.to_string();
        let checked = operation
            .ok_or_else(|| ValidationError::new("operation", "must be selected"))
            .and_then(|op| self.bounds.check(content).map(|()| op));
        let operation = match checked {
            Ok(op) => op,
            Err(e) => {
                debug!(error = %e, "submit rejected: invalid");
                state.field_error = Some(e.clone());
                return Err(Rejection::Invalid(e));
            }
        };
        state.submission += 1;
        state.phase = Phase::Pending;
        state.result = None;
        state.error = None;
        state.field_error = None;
        Ok(Submission {
            controller: self.clone(),
            operation,
            content: content.to_string(),
            id: state.submission,
        })
    }

    /// [`FormController::begin`] followed by [`Submission::run`].
    pub async fn submit(&self, operation: Option<Operation>, content: &str) -> SubmitOutcome {
        match self.begin(operation, content) {
            Ok(submission) => submission.run().await,
            Err(rejection) => SubmitOutcome::Rejected(rejection),
        }
    }

    fn complete(&self, operation: Operation, id: u64, outcome: Result<Output, PipelineError>) -> SubmitOutcome {
        let mut state = self.lock();
        if state.submission != id {
            debug!(submission = id, current = state.submission, "stale completion ignored");
            return SubmitOutcome::Superseded;
        }
        match outcome {
            Ok(output) => {
                let completed = Completed { operation, output };
                state.phase = Phase::Succeeded;
                state.result = Some(completed.clone());
                info!(operation = %operation, submission = id, "submission succeeded");
                SubmitOutcome::Succeeded(completed)
            }
            Err(PipelineError::Validation(e)) => {
                state.phase = Phase::Idle;
                state.field_error = Some(e.clone());
                SubmitOutcome::Rejected(Rejection::Invalid(e))
            }
            Err(e) => {
                let message = e.to_string();
                state.phase = Phase::Failed;
                state.error = Some(message.clone());
                warn!(operation = %operation, submission = id, error = %message, "submission failed");
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Returns to `Idle`, clearing result and errors. An in-flight call is superseded.
    pub fn reset(&self) {
        let mut state = self.lock();
        let submission = state.submission + 1;
        *state = FormState {
            submission,
            ..FormState::default()
        };
        debug!(submission, "form reset");
    }

    /// Clears the error banner; `Failed` returns to `Idle`.
    pub fn dismiss_error(&self) {
        let mut state = self.lock();
        if state.phase == Phase::Failed {
            state.phase = Phase::Idle;
            state.error = None;
        }
    }
}

/// An accepted submission; the form is `Pending` until [`Submission::run`] completes.
///
/// Dropping it without running leaves the form `Pending` until [`FormController::reset`].
pub struct Submission {
    controller: FormController,
    operation: Operation,
    content: String,
    id: u64,
}

impl Submission {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Submission counter value this submission was accepted under.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Makes the single pipeline call and records the outcome, unless a reset superseded it.
    pub async fn run(self) -> SubmitOutcome {
        info!(operation = %self.operation, submission = self.id, "submission started");
        let outcome = self
            .controller
            .pipeline
            .execute(self.operation, &self.content)
            .await;
        self.controller.complete(self.operation, self.id, outcome)
    }
}
