//! # SeoLens
//!
//! Typed prompt dispatch for SEO content analysis. A piece of content goes in with one of
//! four operations (audit, rewrite, FAQ generation, meta info); a structured, validated
//! result comes out and is rendered for display.
//!
//! ## Design principles
//!
//! - **One generic pipeline**: every operation is a (template, input shape, output shape)
//!   triple; [`Pipeline::execute`] validates input, renders the prompt, makes one model call
//!   and validates the reply.
//! - **Closed sets**: [`Operation`], [`Output`] and [`View`] are enums with exhaustive
//!   matches; adding an operation is a compile-time checklist.
//! - **Templates are data**: prompt text lives in `prompts/*.yaml`, is embedded at compile
//!   time and can be overridden from a directory ([`prompts::load`]).
//! - **Nothing unvalidated escapes**: a reply that does not satisfy its output shape becomes
//!   an upstream error, never a partial result.
//!
//! ## Main modules
//!
//! - [`operation`]: [`Operation`] and its wire names.
//! - [`schema`]: [`Shape`] contracts, [`ContentInput`], [`Output`] and its variants.
//! - [`prompts`]: [`TemplateRegistry`], [`Template`], YAML loading.
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`], [`LlmSettings`].
//! - [`pipeline`]: [`Pipeline`], [`Request`].
//! - [`form`]: [`FormController`] state machine, [`ContentBounds`].
//! - [`render`]: [`render()`], [`render_state`], [`View`], [`Panel`].
//! - [`protocol`]: WebSocket and HTTP wire types.
//! - [`error`]: [`ValidationError`], [`PipelineError`], [`UnsupportedOperationError`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use seolens::{render, MockLlm, Operation, Pipeline};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pipeline = Pipeline::with_llm(Arc::new(MockLlm::sample_replies()));
//! let output = pipeline
//!     .execute(Operation::MetaInfo, "Handmade olive-oil soap from Porto.")
//!     .await
//!     .unwrap();
//! println!("{:?}", render(Operation::MetaInfo, &output));
//! # }
//! ```

pub mod error;
pub mod form;
pub mod llm;
pub mod operation;
pub mod pipeline;
pub mod prompts;
pub mod protocol;
pub mod render;
pub mod schema;

pub use error::{PipelineError, UnsupportedOperationError, ValidationError, NO_STRUCTURED_OUTPUT};
pub use form::{
    Completed, ContentBounds, FormController, FormState, Phase, Rejection, SubmitOutcome,
    Submission,
};
pub use llm::{
    build_llm, ChatOpenAI, Generation, LlmClient, LlmError, LlmSettings, LlmUsage, MockLlm,
    Provider, SettingsError,
};
pub use operation::Operation;
pub use pipeline::{Pipeline, Request};
pub use prompts::{Template, TemplateRegistry};
pub use protocol::{
    AnalyzeBody, AnalyzeResponse, ClientRequest, ErrorKind, ErrorResponse, OperationInfo,
    ServerResponse,
};
pub use render::{render, render_state, CountedField, Disclosure, Panel, View};
pub use schema::{
    AuditReport, ContentInput, Faq, FaqList, MetaInfo, Output, RewrittenContent, Shape,
};
