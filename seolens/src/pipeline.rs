//! Dispatch pipeline: validate input, render the prompt, call the model, validate the reply.
//!
//! One generic pipeline serves every [`Operation`]; the operation selects the template and
//! the output shape. A successful `execute` always returns an [`Output`] that satisfied the
//! operation's output shape. No retries and no caching: one call per execution.

use std::sync::Arc;

use tracing::{debug, info_span, warn, Instrument};

use crate::error::PipelineError;
use crate::llm::{build_llm, LlmClient, LlmSettings, SettingsError};
use crate::operation::Operation;
use crate::prompts::{self, TemplateRegistry};
use crate::schema::{ContentInput, Output};

/// One unit of work for the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Request {
    pub operation: Operation,
    pub content: String,
}

impl Request {
    pub fn new(operation: Operation, content: impl Into<String>) -> Self {
        Self {
            operation,
            content: content.into(),
        }
    }
}

/// Shared, immutable pipeline. Cheap to clone; safe to call concurrently.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<TemplateRegistry>,
    llm: Arc<dyn LlmClient>,
}

impl Pipeline {
    pub fn new(registry: Arc<TemplateRegistry>, llm: Arc<dyn LlmClient>) -> Self {
        Self { registry, llm }
    }

    /// Pipeline over the embedded templates.
    pub fn with_llm(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(Arc::new(TemplateRegistry::embedded()), llm)
    }

    /// Pipeline from the environment: templates from `PROMPTS_DIR` (falling back to the
    /// embedded set) and the client chosen by [`LlmSettings::from_env`].
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = LlmSettings::from_env()?;
        debug!(provider = ?settings.provider, model = %settings.model, "building pipeline");
        let registry = prompts::load_or_default(None);
        Ok(Self::new(Arc::new(registry), build_llm(&settings)))
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Runs `operation` over `content`.
    ///
    /// Errors: [`PipelineError::Validation`] when `content` is empty (no external call is
    /// made); [`PipelineError::Upstream`] when the call fails or the reply is missing or
    /// does not satisfy the output shape.
    pub async fn execute(&self, operation: Operation, content: &str) -> Result<Output, PipelineError> {
        let span = info_span!("pipeline", operation = %operation, content_chars = content.chars().count());
        self.run(operation, content).instrument(span).await
    }

    /// Same as [`Pipeline::execute`] for a [`Request`].
    pub async fn dispatch(&self, request: Request) -> Result<Output, PipelineError> {
        self.execute(request.operation, &request.content).await
    }

    async fn run(&self, operation: Operation, content: &str) -> Result<Output, PipelineError> {
        let input = ContentInput::validate(content)?;
        let template = self.registry.get(operation);
        let prompt = template.render(&input.content);
        let shape = operation.output_shape();
        debug!(template = template.name(), prompt_len = prompt.len(), "dispatching");

        let generation = self.llm.generate(&prompt, shape).await.map_err(|e| {
            warn!(error = %e, "generation failed");
            PipelineError::from(e)
        })?;
        if let Some(ref usage) = generation.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "usage"
            );
        }

        let Some(reply) = generation.reply else {
            warn!("model returned no structured reply");
            return Err(PipelineError::no_structured_output());
        };
        match Output::from_reply(operation, reply) {
            Ok(output) => {
                debug!("reply accepted");
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "reply rejected by output shape");
                Err(PipelineError::no_structured_output())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::llm::{LlmError, MockLlm};
    use crate::schema::{AuditReport, Faq, FaqList};
    use serde_json::json;

    const CONTENT: &str = "Handmade olive-oil soap from Porto, cured for six weeks and cut by hand.";

    fn pipeline(llm: MockLlm) -> (Pipeline, Arc<MockLlm>) {
        let llm = Arc::new(llm);
        (Pipeline::with_llm(llm.clone()), llm)
    }

    #[tokio::test]
    async fn execute_returns_narrowed_output() {
        let (p, llm) = pipeline(MockLlm::with_reply(json!({ "report": "Add headings." })));
        let out = p.execute(Operation::Audit, CONTENT).await.unwrap();
        assert_eq!(
            out,
            Output::Audit(AuditReport {
                report: "Add headings.".into()
            })
        );
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_sent_contains_the_content() {
        for op in Operation::ALL {
            let (p, llm) = pipeline(MockLlm::sample_replies());
            p.execute(op, CONTENT).await.unwrap();
            let prompt = llm.last_prompt().unwrap();
            assert!(prompt.contains(CONTENT), "{} prompt lost the content", op);
            assert_eq!(prompt, p.registry().render(op, CONTENT));
        }
    }

    #[tokio::test]
    async fn empty_content_fails_validation_without_calling_model() {
        let (p, llm) = pipeline(MockLlm::sample_replies());
        let err = p.execute(Operation::Rewrite, "").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError { ref field, .. }) if field == "content"
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn absent_reply_is_upstream_error() {
        let (p, _) = pipeline(MockLlm::with_no_reply());
        let err = p.execute(Operation::MetaInfo, CONTENT).await.unwrap_err();
        assert_eq!(err, PipelineError::no_structured_output());
    }

    #[tokio::test]
    async fn reply_with_wrong_shape_is_never_returned() {
        let (p, _) = pipeline(MockLlm::with_reply(json!({ "report": "ok" })));
        let err = p.execute(Operation::FaqGeneration, CONTENT).await.unwrap_err();
        assert_eq!(err.to_string(), "no structured output returned");
    }

    #[tokio::test]
    async fn llm_failure_surfaces_as_upstream_message() {
        let (p, _) = pipeline(MockLlm::failing(LlmError::Quota("monthly quota used".into())));
        let err = p.execute(Operation::Audit, CONTENT).await.unwrap_err();
        match err {
            PipelineError::Upstream(msg) => assert!(msg.contains("monthly quota used")),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn faq_order_is_preserved() {
        let reply = json!({
            "faqs": [
                { "question": "Q1", "answer": "A1" },
                { "question": "Q2", "answer": "A2" },
                { "question": "Q3", "answer": "A3" }
            ]
        });
        let (p, _) = pipeline(MockLlm::with_reply(reply));
        let out = p
            .dispatch(Request::new(Operation::FaqGeneration, CONTENT))
            .await
            .unwrap();
        let expected: Vec<Faq> = (1..=3)
            .map(|i| Faq {
                question: format!("Q{}", i),
                answer: format!("A{}", i),
            })
            .collect();
        assert_eq!(out, Output::Faq(FaqList { faqs: expected }));
    }
}
