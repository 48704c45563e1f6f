//! The closed set of content operations offered by the form.
//!
//! Each [`Operation`] owns one prompt template (see [`crate::prompts`]) and declares one
//! input shape and one output shape (see [`crate::schema`]). Wire names follow the form
//! selector values: `audit`, `rewrite`, `faq`, `meta`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedOperationError;
use crate::schema::{self, Shape};

/// One of the four content-analysis tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operation {
    /// SEO audit report for the content.
    #[default]
    #[serde(rename = "audit")]
    Audit,
    /// Content rewritten for engagement and SEO.
    #[serde(rename = "rewrite")]
    Rewrite,
    /// Frequently asked questions derived from the content.
    #[serde(rename = "faq", alias = "faq_generation")]
    FaqGeneration,
    /// Meta title and description.
    #[serde(rename = "meta", alias = "meta_info")]
    MetaInfo,
}

impl Operation {
    /// All operations in selector order.
    pub const ALL: [Operation; 4] = [
        Operation::Audit,
        Operation::Rewrite,
        Operation::FaqGeneration,
        Operation::MetaInfo,
    ];

    /// Wire name (selector value).
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Audit => "audit",
            Operation::Rewrite => "rewrite",
            Operation::FaqGeneration => "faq",
            Operation::MetaInfo => "meta",
        }
    }

    /// Label shown in the operation selector.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Audit => "SEO Audit",
            Operation::Rewrite => "Content Rewrite",
            Operation::FaqGeneration => "FAQ Generation",
            Operation::MetaInfo => "Meta Info Generator",
        }
    }

    /// Input shape; identical for every current operation.
    pub fn input_shape(self) -> &'static Shape {
        &schema::CONTENT_INPUT
    }

    /// Output shape the model reply must satisfy.
    pub fn output_shape(self) -> &'static Shape {
        match self {
            Operation::Audit => &schema::AUDIT_OUTPUT,
            Operation::Rewrite => &schema::REWRITE_OUTPUT,
            Operation::FaqGeneration => &schema::FAQ_OUTPUT,
            Operation::MetaInfo => &schema::META_OUTPUT,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UnsupportedOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "audit" => Ok(Self::Audit),
            "rewrite" => Ok(Self::Rewrite),
            "faq" | "faq_generation" => Ok(Self::FaqGeneration),
            "meta" | "meta_info" => Ok(Self::MetaInfo),
            _ => Err(UnsupportedOperationError(s.to_string())),
        }
    }
}
