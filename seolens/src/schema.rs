//! Structural shapes for pipeline input and model output, and the narrowed output types.
//!
//! A [`Shape`] is a static contract (field names, kinds, descriptions). It is used twice:
//! rendered as JSON Schema ([`Shape::json_schema`]) to tell the model what to produce, and
//! checked against the reply ([`Shape::validate`]) before narrowing into [`Output`].
//! Validation is structural only; content quality is never judged here. Extra fields in a
//! reply are ignored and dropped on narrowing.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::operation::Operation;

/// Kind of a shape field.
#[derive(Debug)]
pub enum FieldKind {
    /// A string with at least `min_len` characters.
    String { min_len: usize },
    /// An ordered list of objects, each with the given fields.
    List(&'static [Field]),
}

/// One named field of a shape.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

/// Structural contract for an object value.
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [Field],
}

/// Pipeline input for every current operation: `{ content: string }`, non-empty.
pub static CONTENT_INPUT: Shape = Shape {
    name: "content_input",
    description: "Content submitted for analysis.",
    fields: &[Field {
        name: "content",
        description: "The content to analyse.",
        kind: FieldKind::String { min_len: 1 },
    }],
};

pub static AUDIT_OUTPUT: Shape = Shape {
    name: "seo_audit",
    description: "A concise SEO audit report.",
    fields: &[Field {
        name: "report",
        description: "A concise SEO audit report highlighting areas for improvement.",
        kind: FieldKind::String { min_len: 0 },
    }],
};

pub static REWRITE_OUTPUT: Shape = Shape {
    name: "content_rewrite",
    description: "Content rewritten for SEO and user engagement.",
    fields: &[Field {
        name: "rewrittenContent",
        description: "The rewritten content, optimized for SEO and user engagement.",
        kind: FieldKind::String { min_len: 0 },
    }],
};

pub static FAQ_OUTPUT: Shape = Shape {
    name: "faq_list",
    description: "Frequently asked questions generated from the content.",
    fields: &[Field {
        name: "faqs",
        description: "The generated FAQs.",
        kind: FieldKind::List(&[
            Field {
                name: "question",
                description: "The FAQ question.",
                kind: FieldKind::String { min_len: 0 },
            },
            Field {
                name: "answer",
                description: "The answer to the FAQ question.",
                kind: FieldKind::String { min_len: 0 },
            },
        ]),
    }],
};

pub static META_OUTPUT: Shape = Shape {
    name: "meta_info",
    description: "SEO-optimized meta title and description.",
    fields: &[
        Field {
            name: "title",
            description: "The SEO-optimized meta title.",
            kind: FieldKind::String { min_len: 0 },
        },
        Field {
            name: "description",
            description: "The SEO-optimized meta description.",
            kind: FieldKind::String { min_len: 0 },
        },
    ],
};

impl Shape {
    /// Checks `value` against this shape. The error names the first offending field path.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate_object(self.fields, value, "")
    }

    /// JSON Schema for this shape (object, all fields required, no extra properties).
    pub fn json_schema(&self) -> Value {
        let mut schema = object_schema(self.fields);
        if let Value::Object(ref mut map) = schema {
            map.insert("description".to_string(), json!(self.description));
        }
        schema
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn validate_object(fields: &[Field], value: &Value, path: &str) -> Result<(), ValidationError> {
    let obj = value.as_object().ok_or_else(|| {
        let at = if path.is_empty() { "(root)" } else { path };
        ValidationError::new(at, "must be an object")
    })?;
    for field in fields {
        let field_path = join_path(path, field.name);
        let v = match obj.get(field.name) {
            None | Some(Value::Null) => {
                return Err(ValidationError::new(field_path, "is required"));
            }
            Some(v) => v,
        };
        match &field.kind {
            FieldKind::String { min_len } => {
                let s = v
                    .as_str()
                    .ok_or_else(|| ValidationError::new(&field_path, "must be a string"))?;
                if s.chars().count() < *min_len {
                    return Err(ValidationError::new(
                        field_path,
                        format!("must be at least {} character(s)", min_len),
                    ));
                }
            }
            FieldKind::List(item_fields) => {
                let items = v
                    .as_array()
                    .ok_or_else(|| ValidationError::new(&field_path, "must be a list"))?;
                for (i, item) in items.iter().enumerate() {
                    validate_object(item_fields, item, &format!("{}[{}]", field_path, i))?;
                }
            }
        }
    }
    Ok(())
}

fn object_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        let prop = match &field.kind {
            FieldKind::String { min_len } => {
                let mut p = json!({ "type": "string", "description": field.description });
                if *min_len > 0 {
                    p["minLength"] = json!(min_len);
                }
                p
            }
            FieldKind::List(item_fields) => json!({
                "type": "array",
                "description": field.description,
                "items": object_schema(item_fields),
            }),
        };
        properties.insert(field.name.to_string(), prop);
    }
    let required: Vec<&str> = fields.iter().map(|f| f.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Validated pipeline input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInput {
    pub content: String,
}

impl ContentInput {
    /// Checks `content` against [`CONTENT_INPUT`].
    pub fn validate(content: impl Into<String>) -> Result<Self, ValidationError> {
        let input = Self {
            content: content.into(),
        };
        CONTENT_INPUT.validate(&json!({ "content": &input.content }))?;
        Ok(input)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub report: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenContent {
    pub rewritten_content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// FAQs in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqList {
    pub faqs: Vec<Faq>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub title: String,
    pub description: String,
}

/// A validated model reply, one variant per operation.
///
/// Serializes as the bare reply object (e.g. `{"report": "..."}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Output {
    Audit(AuditReport),
    Rewrite(RewrittenContent),
    Faq(FaqList),
    Meta(MetaInfo),
}

impl Output {
    /// Operation whose output shape this value satisfies.
    pub fn operation(&self) -> Operation {
        match self {
            Output::Audit(_) => Operation::Audit,
            Output::Rewrite(_) => Operation::Rewrite,
            Output::Faq(_) => Operation::FaqGeneration,
            Output::Meta(_) => Operation::MetaInfo,
        }
    }

    /// Validates `reply` against the operation's output shape and narrows it.
    pub fn from_reply(operation: Operation, reply: Value) -> Result<Self, ValidationError> {
        let shape = operation.output_shape();
        shape.validate(&reply)?;
        let narrowed = match operation {
            Operation::Audit => serde_json::from_value(reply).map(Output::Audit),
            Operation::Rewrite => serde_json::from_value(reply).map(Output::Rewrite),
            Operation::FaqGeneration => serde_json::from_value(reply).map(Output::Faq),
            Operation::MetaInfo => serde_json::from_value(reply).map(Output::Meta),
        };
        narrowed.map_err(|e| ValidationError::new(shape.name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_input_rejects_empty_content() {
        let err = ContentInput::validate("").unwrap_err();
        assert_eq!(err.field, "content");
        assert!(err.constraint.contains("at least 1"));
    }

    #[test]
    fn content_input_accepts_single_character() {
        let input = ContentInput::validate("x").unwrap();
        assert_eq!(input.content, "x");
    }

    #[test]
    fn audit_reply_missing_report_names_field() {
        let err = Output::from_reply(Operation::Audit, json!({ "summary": "x" })).unwrap_err();
        assert_eq!(err, ValidationError::new("report", "is required"));
    }

    #[test]
    fn null_field_counts_as_missing() {
        let err =
            Output::from_reply(Operation::MetaInfo, json!({ "title": "t", "description": null }))
                .unwrap_err();
        assert_eq!(err, ValidationError::new("description", "is required"));
    }

    #[test]
    fn non_object_reply_is_rejected_at_root() {
        let err = Output::from_reply(Operation::Rewrite, json!("plain text")).unwrap_err();
        assert_eq!(err, ValidationError::new("(root)", "must be an object"));
    }

    #[test]
    fn faq_item_with_wrong_type_reports_indexed_path() {
        let reply = json!({
            "faqs": [
                { "question": "Q1", "answer": "A1" },
                { "question": "Q2", "answer": 42 }
            ]
        });
        let err = Output::from_reply(Operation::FaqGeneration, reply).unwrap_err();
        assert_eq!(err, ValidationError::new("faqs[1].answer", "must be a string"));
    }

    #[test]
    fn faqs_must_be_a_list() {
        let err = Output::from_reply(Operation::FaqGeneration, json!({ "faqs": "Q1" }))
            .unwrap_err();
        assert_eq!(err, ValidationError::new("faqs", "must be a list"));
    }

    #[test]
    fn empty_faq_list_is_valid() {
        let out = Output::from_reply(Operation::FaqGeneration, json!({ "faqs": [] })).unwrap();
        assert_eq!(out, Output::Faq(FaqList { faqs: vec![] }));
    }

    #[test]
    fn rewrite_reply_uses_camel_case_field() {
        let out = Output::from_reply(
            Operation::Rewrite,
            json!({ "rewrittenContent": "better text" }),
        )
        .unwrap();
        assert_eq!(
            out,
            Output::Rewrite(RewrittenContent {
                rewritten_content: "better text".to_string()
            })
        );
        assert_eq!(out.operation(), Operation::Rewrite);
    }

    #[test]
    fn extra_fields_are_dropped_on_narrowing() {
        let out = Output::from_reply(
            Operation::Audit,
            json!({ "report": "ok", "confidence": 0.9 }),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "report": "ok" })
        );
    }

    #[test]
    fn meta_lengths_are_not_enforced_here() {
        let long_title = "t".repeat(200);
        let out = Output::from_reply(
            Operation::MetaInfo,
            json!({ "title": long_title, "description": "" }),
        );
        assert!(out.is_ok());
    }

    #[test]
    fn json_schema_for_faq_nests_item_object() {
        let schema = FAQ_OUTPUT.json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["faqs"]));
        assert_eq!(schema["properties"]["faqs"]["type"], "array");
        assert_eq!(
            schema["properties"]["faqs"]["items"]["required"],
            json!(["question", "answer"])
        );
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn json_schema_for_input_carries_min_length() {
        let schema = CONTENT_INPUT.json_schema();
        assert_eq!(schema["properties"]["content"]["minLength"], json!(1));
        assert!(schema["properties"]["report"].is_null());
    }

    #[test]
    fn output_serializes_as_bare_reply_object() {
        let out = Output::Meta(MetaInfo {
            title: "T".into(),
            description: "D".into(),
        });
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "title": "T", "description": "D" })
        );
    }
}
