//! Prompt template registry: one fixed template per [`Operation`].
//!
//! Templates are data: default text lives in `seolens/prompts/*.yaml` and is embedded at
//! compile time; a directory of YAML files can override any of them (see [`load`]). The
//! registry is built once at start-up, never mutated, and handed to the pipeline explicitly.
//!
//! Rendering is a single literal substitution of [`PLACEHOLDER`]; no conditionals or loops.

mod load;

pub use load::{default_from_embedded, load, load_or_default, LoadError};

use serde::Deserialize;

use crate::operation::Operation;

/// Substitution point for the submitted body text.
pub const PLACEHOLDER: &str = "{{content}}";

/// One YAML template file: `name` and `template`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TemplateFile {
    pub(crate) name: String,
    pub(crate) template: String,
}

/// A named template bound to one operation. Contains exactly one [`PLACEHOLDER`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    operation: Operation,
    name: String,
    text: String,
}

impl Template {
    pub(crate) fn new(operation: Operation, name: String, text: String) -> Self {
        Self {
            operation,
            name,
            text,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template text, placeholder included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes `content` for the placeholder. Content is inserted verbatim and is not
    /// scanned for further placeholders.
    pub fn render(&self, content: &str) -> String {
        self.text.replacen(PLACEHOLDER, content, 1)
    }
}

/// Immutable set of templates, one per operation.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    audit: Template,
    rewrite: Template,
    faq: Template,
    meta: Template,
}

impl TemplateRegistry {
    pub(crate) fn from_parts(audit: Template, rewrite: Template, faq: Template, meta: Template) -> Self {
        Self {
            audit,
            rewrite,
            faq,
            meta,
        }
    }

    /// Registry built from the embedded default templates.
    pub fn embedded() -> Self {
        default_from_embedded()
    }

    pub fn get(&self, operation: Operation) -> &Template {
        match operation {
            Operation::Audit => &self.audit,
            Operation::Rewrite => &self.rewrite,
            Operation::FaqGeneration => &self.faq,
            Operation::MetaInfo => &self.meta,
        }
    }

    /// Prompt text for `operation` with `content` substituted.
    pub fn render(&self, operation: Operation, content: &str) -> String {
        self.get(operation).render(content)
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::embedded()
    }
}
