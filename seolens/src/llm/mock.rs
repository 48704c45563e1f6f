//! Mock LLM for tests and offline runs.
//!
//! Returns a fixed reply, no reply, a fixed failure, or a sample reply built from the
//! requested shape. Counts calls and remembers the last prompt so tests can assert on
//! what reached the external boundary. An optional delay keeps a call in flight long
//! enough to exercise the form controller's pending state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::llm::{Generation, LlmClient, LlmError};
use crate::schema::{Field, FieldKind, Shape};

enum Behavior {
    Reply(Option<Value>),
    Fail(LlmError),
    Sample,
}

/// Mock LLM with configurable behaviour.
///
/// **Interaction**: Implements `LlmClient`; used by the pipeline in tests and by
/// `LLM_PROVIDER=mock`.
pub struct MockLlm {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlm {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always returns `reply`, whatever the shape.
    pub fn with_reply(reply: Value) -> Self {
        Self::with_behavior(Behavior::Reply(Some(reply)))
    }

    /// Succeeds without a structured reply.
    pub fn with_no_reply() -> Self {
        Self::with_behavior(Behavior::Reply(None))
    }

    /// Always fails with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::with_behavior(Behavior::Fail(error))
    }

    /// Answers every shape with sample values (`"Sample question"`, one list item, ...).
    pub fn sample_replies() -> Self {
        Self::with_behavior(Behavior::Sample)
    }

    /// Sleep before answering (builder).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt passed to the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|g| g.clone())
    }
}

fn sample_object(fields: &[Field]) -> Value {
    let mut map = Map::new();
    for field in fields {
        let value = match &field.kind {
            FieldKind::String { .. } => json!(format!("Sample {}", field.name)),
            FieldKind::List(item_fields) => json!([sample_object(item_fields)]),
        };
        map.insert(field.name.to_string(), value);
    }
    Value::Object(map)
}

/// Reply that satisfies `shape`, with placeholder strings.
pub(crate) fn sample_reply(shape: &Shape) -> Value {
    sample_object(shape.fields)
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn generate(&self, prompt: &str, shape: &Shape) -> Result<Generation, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut g) = self.last_prompt.lock() {
            *g = Some(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Reply(reply) => Ok(Generation {
                reply: reply.clone(),
                usage: None,
            }),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Sample => Ok(Generation::with_reply(sample_reply(shape))),
        }
    }
}
