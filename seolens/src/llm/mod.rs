//! External generation boundary.
//!
//! The pipeline hands a rendered prompt and the expected output [`Shape`] to an
//! [`LlmClient`] and gets back a [`Generation`]: the structured reply when the model
//! produced one, or `None` when it answered with something that is not a JSON object.
//! Transport, quota and model-side failures are distinguished by [`LlmError`].
//!
//! Implementations: [`MockLlm`] (canned replies, tests and offline demos) and
//! [`ChatOpenAI`] (OpenAI-compatible Chat Completions).

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use std::str::FromStr;
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::schema::Shape;

/// Default model when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Token usage for one call, when the provider reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Outcome of a successful call.
#[derive(Clone, Debug, Default)]
pub struct Generation {
    /// Structured reply; `None` when the model returned nothing parseable.
    pub reply: Option<Value>,
    pub usage: Option<LlmUsage>,
}

impl Generation {
    pub fn with_reply(reply: Value) -> Self {
        Self {
            reply: Some(reply),
            usage: None,
        }
    }
}

/// Failure of the external call itself.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LlmError {
    /// Network or HTTP-level failure reaching the provider.
    #[error("transport error: {0}")]
    Transport(String),
    /// Quota or rate limit exhausted.
    #[error("quota exceeded: {0}")]
    Quota(String),
    /// The provider rejected the request or failed to produce a reply.
    #[error("model error: {0}")]
    Model(String),
}

/// Generation client: given a prompt and the expected output shape, returns a structured reply.
///
/// **Interaction**: called once per submission by [`crate::pipeline::Pipeline`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str, shape: &Shape) -> Result<Generation, LlmError>;
}

/// Which [`LlmClient`] implementation to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    /// Canned replies; no network.
    Mock,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("unknown LLM_PROVIDER: {} (use openai or mock)", s)),
        }
    }
}

/// Invalid LLM settings in the environment.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Provider(String),
    #[error("invalid OPENAI_TEMPERATURE: {0}")]
    Temperature(String),
    #[error("invalid MOCK_REPLY JSON: {0}")]
    MockReply(String),
}

/// Generation settings read from the environment.
#[derive(Clone, Debug, Default)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    /// Fixed reply for the mock provider; `None` makes the mock answer with sample values.
    pub mock_reply: Option<Value>,
}

impl LlmSettings {
    /// Reads settings from the environment.
    ///
    /// - `LLM_PROVIDER`: `openai` (default) or `mock`
    /// - `OPENAI_MODEL` (or `MODEL`): default [`DEFAULT_MODEL`]
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL` (or `OPENAI_API_BASE`)
    /// - `OPENAI_TEMPERATURE`: 0–2
    /// - `MOCK_REPLY`: JSON reply returned by the mock provider
    pub fn from_env() -> Result<Self, SettingsError> {
        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(s) if !s.trim().is_empty() => s.trim().parse().map_err(SettingsError::Provider)?,
            _ => Provider::default(),
        };
        let model = std::env::var("OPENAI_MODEL")
            .or_else(|_| std::env::var("MODEL"))
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty());
        let base_url = std::env::var("OPENAI_BASE_URL")
            .or_else(|_| std::env::var("OPENAI_API_BASE"))
            .ok()
            .filter(|s| !s.is_empty());
        let temperature = match std::env::var("OPENAI_TEMPERATURE") {
            Ok(s) => Some(
                s.trim()
                    .parse::<f32>()
                    .map_err(|e| SettingsError::Temperature(format!("{}: {}", s, e)))?,
            ),
            Err(_) => None,
        };
        let mock_reply = match std::env::var("MOCK_REPLY") {
            Ok(s) => Some(
                serde_json::from_str(&s).map_err(|e| SettingsError::MockReply(e.to_string()))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            provider,
            model,
            api_key,
            base_url,
            temperature,
            mock_reply,
        })
    }
}

/// Builds the configured client.
pub fn build_llm(settings: &LlmSettings) -> Arc<dyn LlmClient> {
    match settings.provider {
        Provider::Mock => match &settings.mock_reply {
            Some(reply) => Arc::new(MockLlm::with_reply(reply.clone())),
            None => Arc::new(MockLlm::sample_replies()),
        },
        Provider::OpenAi => {
            let mut config = OpenAIConfig::new();
            if let Some(ref key) = settings.api_key {
                config = config.with_api_key(key);
            }
            if let Some(ref base) = settings.base_url {
                config = config.with_api_base(base);
            }
            let model = if settings.model.is_empty() {
                DEFAULT_MODEL
            } else {
                settings.model.as_str()
            };
            let mut client = ChatOpenAI::with_config(config, model);
            if let Some(t) = settings.temperature {
                client = client.with_temperature(t);
            }
            Arc::new(client)
        }
    }
}
