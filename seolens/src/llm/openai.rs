//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! The expected output shape is declared as a single function tool whose parameters are the
//! shape's JSON Schema, with tool choice `required`; the tool-call arguments are the
//! structured reply. Providers that ignore tools and answer in plain content still work when
//! that content is a JSON object (optionally inside a ```json fence).
//!
//! Requires `OPENAI_API_KEY` (or explicit config). `OPENAI_BASE_URL` selects any
//! OpenAI-compatible endpoint.
//!
//! **Interaction**: Implements `LlmClient`; used by the pipeline like `MockLlm`.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde_json::Value;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::llm::{Generation, LlmClient, LlmError, LlmUsage};
use crate::schema::Shape;

use async_openai::{
    config::{Config, OpenAIConfig},
    error::OpenAIError,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionObject, ToolChoiceOptions,
    },
    Client,
};

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// `ChatOpenAI::with_config`.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    /// Chat completions endpoint resolved from the client's config; logged per call.
    url: String,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::default(), model)
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    ///
    /// Transient failures (429, 5xx) are not retried: the first error is returned.
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let url = config.url("/chat/completions");
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Self {
            client: Client::with_config(config).with_backoff(no_retry),
            url,
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat completions endpoint this client calls.
    pub fn chat_completions_url(&self) -> &str {
        &self.url
    }

    /// The output shape as the one tool the model must call.
    fn shape_tool(shape: &Shape) -> ChatCompletionTools {
        ChatCompletionTools::Function(ChatCompletionTool {
            function: FunctionObject {
                name: shape.name.to_string(),
                description: Some(shape.description.to_string()),
                parameters: Some(shape.json_schema()),
                ..Default::default()
            },
        })
    }
}

/// Maps an API error (type + message) to quota or model failure.
pub(crate) fn classify_api_error(kind: Option<&str>, message: &str) -> LlmError {
    let kind = kind.unwrap_or_default();
    let lower = message.to_lowercase();
    if kind == "insufficient_quota"
        || kind == "rate_limit_exceeded"
        || kind == "requests"
        || kind == "tokens"
        || lower.contains("quota")
        || lower.contains("rate limit")
    {
        LlmError::Quota(message.to_string())
    } else {
        LlmError::Model(message.to_string())
    }
}

fn map_openai_error(e: OpenAIError) -> LlmError {
    match e {
        OpenAIError::Reqwest(e) => LlmError::Transport(e.to_string()),
        OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
        other => LlmError::Model(other.to_string()),
    }
}

/// Parses a reply string into a JSON object. Accepts a ```json fenced block.
/// Anything that is not a JSON object yields `None`.
pub(crate) fn parse_reply(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    match serde_json::from_str::<Value>(unfenced) {
        Ok(v) if v.is_object() => Some(v),
        _ => None,
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn generate(&self, prompt: &str, shape: &Shape) -> Result<Generation, LlmError> {
        let trace_id = Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(prompt),
        )]);
        args.tools(vec![Self::shape_tool(shape)]);
        args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Required));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args
            .build()
            .map_err(|e| LlmError::Model(format!("OpenAI request build failed: {}", e)))?;

        debug!(
            trace_id = %trace_id,
            url = %self.url,
            model = %self.model,
            shape = shape.name,
            prompt_len = prompt.len(),
            temperature = ?self.temperature,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, response = %js, "OpenAI response body");
        }

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Model("OpenAI returned no choices".to_string()))?;

        let msg = choice.message;
        let arguments = msg.tool_calls.unwrap_or_default().into_iter().find_map(|tc| {
            if let ChatCompletionMessageToolCalls::Function(f) = tc {
                Some(f.function.arguments)
            } else {
                None
            }
        });

        let reply = match (arguments, msg.content) {
            (Some(args), _) => parse_reply(&args),
            (None, Some(content)) => parse_reply(&content),
            (None, None) => None,
        };
        if reply.is_none() {
            warn!(trace_id = %trace_id, shape = shape.name, "OpenAI reply carried no JSON object");
        }

        Ok(Generation { reply, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AUDIT_OUTPUT;

    #[test]
    fn chat_openai_with_config_keeps_model() {
        let config = OpenAIConfig::new().with_api_key("test-key");
        let client = ChatOpenAI::with_config(config, "gpt-4o-mini").with_temperature(0.3);
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.temperature, Some(0.3));
    }

    #[test]
    fn chat_completions_url_follows_configured_base() {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("http://127.0.0.1:4010/v1");
        let client = ChatOpenAI::with_config(config, "gpt-4o-mini");
        assert_eq!(
            client.chat_completions_url(),
            "http://127.0.0.1:4010/v1/chat/completions"
        );
    }

    #[test]
    fn parse_reply_accepts_plain_and_fenced_objects() {
        assert_eq!(
            parse_reply(r#"{"report":"ok"}"#),
            Some(serde_json::json!({ "report": "ok" }))
        );
        assert_eq!(
            parse_reply("```json\n{\"report\":\"ok\"}\n```"),
            Some(serde_json::json!({ "report": "ok" }))
        );
    }

    #[test]
    fn parse_reply_rejects_prose_and_non_objects() {
        assert_eq!(parse_reply("Here is your report: fine."), None);
        assert_eq!(parse_reply("[1, 2]"), None);
        assert_eq!(parse_reply(""), None);
    }

    #[test]
    fn classify_api_error_detects_quota() {
        assert!(matches!(
            classify_api_error(Some("insufficient_quota"), "You exceeded your current quota"),
            LlmError::Quota(_)
        ));
        assert!(matches!(
            classify_api_error(None, "Rate limit reached for requests"),
            LlmError::Quota(_)
        ));
    }

    #[test]
    fn classify_api_error_defaults_to_model() {
        let err = classify_api_error(Some("invalid_request_error"), "model not found");
        assert_eq!(err, LlmError::Model("model not found".to_string()));
    }

    #[test]
    fn shape_tool_declares_shape_schema() {
        let tool = ChatOpenAI::shape_tool(&AUDIT_OUTPUT);
        let ChatCompletionTools::Function(t) = tool else {
            panic!("expected function tool");
        };
        assert_eq!(t.function.name, "seo_audit");
        assert_eq!(t.function.parameters, Some(AUDIT_OUTPUT.json_schema()));
    }

    /// Unreachable base returns a transport error (no real API key needed).
    #[tokio::test]
    async fn generate_with_unreachable_base_returns_transport_error() {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("http://127.0.0.1:1");
        let client = ChatOpenAI::with_config(config, "gpt-4o-mini");
        let err = client.generate("Hello", &AUDIT_OUTPUT).await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    #[ignore = "Requires OPENAI_API_KEY; run with: cargo test -p seolens generate_with_real_api -- --ignored"]
    async fn generate_with_real_api_returns_structured_reply() {
        std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set for this test");
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let client = ChatOpenAI::new(model);
        let out = client
            .generate("Audit this: We sell handmade soap in Porto.", &AUDIT_OUTPUT)
            .await
            .expect("generate with real API should succeed");
        let reply = out.reply.expect("structured reply");
        assert!(AUDIT_OUTPUT.validate(&reply).is_ok());
    }
}
