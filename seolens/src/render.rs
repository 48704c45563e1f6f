//! Result renderer: maps an operation and its validated output to a presentation model.
//!
//! Rendering is pure; the same input always yields the same [`View`]. Surfaces (HTML page,
//! terminal, JSON API) draw the view; none of them inspect [`Output`] directly.

use serde::{Deserialize, Serialize};

use crate::form::{FormState, Phase};
use crate::operation::Operation;
use crate::schema::Output;

/// Recommended maximum length of a meta title, in characters.
pub const META_TITLE_LIMIT: usize = 60;
/// Recommended maximum length of a meta description, in characters.
pub const META_DESCRIPTION_LIMIT: usize = 160;

pub const REWRITE_TITLE: &str = "Rewritten Content";
pub const UNSUPPORTED_TITLE: &str = "Unsupported analysis type";

/// One expandable question/answer entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    /// Stable identifier (`item-0`, `item-1`, ...).
    pub id: String,
    pub summary: String,
    pub detail: String,
}

/// A labelled value shown with its character count against an advisory limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedField {
    pub label: String,
    pub value: String,
    pub count: usize,
    pub limit: usize,
    /// `count > limit`; advisory only.
    pub over_limit: bool,
    pub copyable: bool,
}

impl CountedField {
    fn new(label: &str, value: &str, limit: usize) -> Self {
        let count = value.chars().count();
        Self {
            label: label.to_string(),
            value: value.to_string(),
            count,
            limit,
            over_limit: count > limit,
            copyable: true,
        }
    }
}

/// Presentation model of one result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    /// Read-only block of text.
    Prose { body: String },
    /// Titled text with a copy action.
    Copyable { title: String, body: String },
    /// Expandable entries in order.
    Disclosures { items: Vec<Disclosure> },
    /// Fields with character counts.
    CountedFields { fields: Vec<CountedField> },
    /// Placeholder for a result that cannot be drawn.
    Unsupported { title: String, message: String },
}

impl View {
    pub fn unsupported(message: impl Into<String>) -> Self {
        View::Unsupported {
            title: UNSUPPORTED_TITLE.to_string(),
            message: message.into(),
        }
    }
}

/// Renders `output` as produced for `operation`.
///
/// A mismatched pair renders [`View::Unsupported`] instead of failing.
pub fn render(operation: Operation, output: &Output) -> View {
    match (operation, output) {
        (Operation::Audit, Output::Audit(a)) => View::Prose {
            body: a.report.clone(),
        },
        (Operation::Rewrite, Output::Rewrite(r)) => View::Copyable {
            title: REWRITE_TITLE.to_string(),
            body: r.rewritten_content.clone(),
        },
        (Operation::FaqGeneration, Output::Faq(list)) => View::Disclosures {
            items: list
                .faqs
                .iter()
                .enumerate()
                .map(|(i, faq)| Disclosure {
                    id: format!("item-{}", i),
                    summary: faq.question.clone(),
                    detail: faq.answer.clone(),
                })
                .collect(),
        },
        (Operation::MetaInfo, Output::Meta(meta)) => View::CountedFields {
            fields: vec![
                CountedField::new("Meta Title", &meta.title, META_TITLE_LIMIT),
                CountedField::new("Meta Description", &meta.description, META_DESCRIPTION_LIMIT),
            ],
        },
        (op, out) => View::unsupported(format!(
            "{} result cannot be displayed as {}",
            out.operation().label(),
            op.label()
        )),
    }
}

/// What the output card shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum Panel {
    /// "Ready to Optimize" placeholder.
    Empty,
    Loading,
    Error { message: String },
    Result { operation: Operation, view: View },
}

/// Maps the whole form state to the output card.
pub fn render_state(state: &FormState) -> Panel {
    match state.phase {
        Phase::Pending => Panel::Loading,
        Phase::Failed => Panel::Error {
            message: state.error.clone().unwrap_or_default(),
        },
        Phase::Succeeded => match &state.result {
            Some(done) => Panel::Result {
                operation: done.operation,
                view: render(done.operation, &done.output),
            },
            None => Panel::Empty,
        },
        Phase::Idle => Panel::Empty,
    }
}
