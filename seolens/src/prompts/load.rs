//! Load prompt templates from a directory of YAML files, falling back to the embedded set.
//!
//! **Canonical source**: default template text lives in `seolens/prompts/*.yaml`; the files
//! are embedded at compile time and used for any operation without an override file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Template, TemplateFile, TemplateRegistry, PLACEHOLDER};
use crate::operation::Operation;

macro_rules! embed_prompt_yaml {
    ($name:literal) => {
        include_str!(concat!("../../prompts/", $name))
    };
}
const EMBED_AUDIT: &str = embed_prompt_yaml!("audit.yaml");
const EMBED_REWRITE: &str = embed_prompt_yaml!("rewrite.yaml");
const EMBED_FAQ: &str = embed_prompt_yaml!("faq.yaml");
const EMBED_META: &str = embed_prompt_yaml!("meta.yaml");

/// Error when loading templates from a directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
    #[error("template in {path} must contain exactly one {placeholder} (found {found})")]
    Placeholder {
        path: String,
        placeholder: &'static str,
        found: usize,
    },
}

/// Default directory name when `PROMPTS_DIR` is not set.
const DEFAULT_PROMPTS_DIR: &str = "prompts";

fn file_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Audit => "audit.yaml",
        Operation::Rewrite => "rewrite.yaml",
        Operation::FaqGeneration => "faq.yaml",
        Operation::MetaInfo => "meta.yaml",
    }
}

fn embedded_yaml(operation: Operation) -> &'static str {
    match operation {
        Operation::Audit => EMBED_AUDIT,
        Operation::Rewrite => EMBED_REWRITE,
        Operation::FaqGeneration => EMBED_FAQ,
        Operation::MetaInfo => EMBED_META,
    }
}

/// Returns the directory to load from: `dir` if `Some`, else `PROMPTS_DIR` env, else `./prompts`.
fn prompts_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(PathBuf::from).unwrap_or_else(|| {
        std::env::var("PROMPTS_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR))
    })
}

/// Reads and parses a YAML file into `T`. A missing file is `Ok(None)`.
fn read_yaml_file<T>(dir: &Path, name: &str) -> Result<Option<T>, LoadError>
where
    T: for<'de> Deserialize<'de>,
{
    let path = dir.join(name);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Ok(None);
            }
            return Err(LoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };
    let value: T = serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(value))
}

fn to_template(operation: Operation, file: TemplateFile, path: &str) -> Result<Template, LoadError> {
    let found = file.template.matches(PLACEHOLDER).count();
    if found != 1 {
        return Err(LoadError::Placeholder {
            path: path.to_string(),
            placeholder: PLACEHOLDER,
            found,
        });
    }
    Ok(Template::new(operation, file.name, file.template))
}

fn embedded_template(operation: Operation) -> Template {
    let path = format!("<embedded>/{}", file_name(operation));
    serde_yaml::from_str::<TemplateFile>(embedded_yaml(operation))
        .map_err(|e| LoadError::ParseYaml {
            path: path.clone(),
            message: e.to_string(),
        })
        .and_then(|file| to_template(operation, file, &path))
        .unwrap_or_else(|e| {
            warn!(error = %e, "embedded template unusable, using bare placeholder");
            Template::new(
                operation,
                operation.as_str().to_string(),
                format!("Content: {}", PLACEHOLDER),
            )
        })
}

fn load_one(base: &Path, operation: Operation) -> Result<Template, LoadError> {
    let name = file_name(operation);
    match read_yaml_file::<TemplateFile>(base, name)? {
        Some(file) => {
            let path = base.join(name).display().to_string();
            debug!(operation = %operation, path = %path, "template override loaded");
            to_template(operation, file, &path)
        }
        None => Ok(embedded_template(operation)),
    }
}

/// Loads templates from a directory: `audit.yaml`, `rewrite.yaml`, `faq.yaml`, `meta.yaml`.
///
/// If `dir` is `None`, uses `PROMPTS_DIR` env or `./prompts`. Missing files keep the embedded
/// default for that operation. Errors when the directory is missing, or when a present file
/// cannot be read, fails to parse, or does not contain exactly one placeholder.
pub fn load(dir: Option<&Path>) -> Result<TemplateRegistry, LoadError> {
    let base = prompts_dir(dir);
    if !base.exists() || !base.is_dir() {
        return Err(LoadError::DirNotFound(base.display().to_string()));
    }
    Ok(TemplateRegistry::from_parts(
        load_one(&base, Operation::Audit)?,
        load_one(&base, Operation::Rewrite)?,
        load_one(&base, Operation::FaqGeneration)?,
        load_one(&base, Operation::MetaInfo)?,
    ))
}

/// Registry from the embedded YAML in `seolens/prompts/*.yaml`.
pub fn default_from_embedded() -> TemplateRegistry {
    TemplateRegistry::from_parts(
        embedded_template(Operation::Audit),
        embedded_template(Operation::Rewrite),
        embedded_template(Operation::FaqGeneration),
        embedded_template(Operation::MetaInfo),
    )
}

/// Loads from `dir` when possible; otherwise logs why and returns the embedded registry.
/// A missing directory is the normal case and is only logged at debug level.
pub fn load_or_default(dir: Option<&Path>) -> TemplateRegistry {
    match load(dir) {
        Ok(registry) => registry,
        Err(LoadError::DirNotFound(path)) => {
            debug!(path = %path, "no prompts directory, using embedded templates");
            default_from_embedded()
        }
        Err(e) => {
            warn!(error = %e, "prompt templates not loaded, using embedded templates");
            default_from_embedded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_yaml_parses_with_one_placeholder() {
        for op in Operation::ALL {
            let file: TemplateFile = serde_yaml::from_str(embedded_yaml(op)).unwrap();
            assert_eq!(file.template.matches(PLACEHOLDER).count(), 1, "{}", op);
        }
    }

    #[test]
    fn load_nonexistent_dir_returns_error() {
        let result = load(Some(Path::new("/nonexistent_prompts_dir_12345")));
        assert!(matches!(result.unwrap_err(), LoadError::DirNotFound(_)));
    }

    #[test]
    fn load_or_default_nonexistent_returns_embedded() {
        let registry = load_or_default(Some(Path::new("/nonexistent_prompts_dir_12345")));
        assert_eq!(
            registry.get(Operation::Audit),
            default_from_embedded().get(Operation::Audit)
        );
    }

    #[test]
    fn load_from_dir_overrides_one_operation() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("faq.yaml"),
            "name: short_faq\ntemplate: \"List FAQs for: {{content}}\"\n",
        )
        .unwrap();
        let registry = load(Some(temp.path())).unwrap();
        assert_eq!(registry.get(Operation::FaqGeneration).name(), "short_faq");
        assert_eq!(
            registry.render(Operation::FaqGeneration, "cats"),
            "List FAQs for: cats"
        );
        assert_eq!(registry.get(Operation::Audit).name(), "seo_audit");
    }

    #[test]
    fn load_invalid_yaml_returns_parse_error() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("audit.yaml"), "template: [not closed").unwrap();
        let err = load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, LoadError::ParseYaml { .. }));
    }

    #[test]
    fn load_template_without_placeholder_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("meta.yaml"),
            "name: meta\ntemplate: \"Write a meta title.\"\n",
        )
        .unwrap();
        let err = load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, LoadError::Placeholder { found: 0, .. }));
    }

    #[test]
    fn load_template_with_two_placeholders_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("rewrite.yaml"),
            "name: rw\ntemplate: \"{{content}} and {{content}}\"\n",
        )
        .unwrap();
        let err = load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, LoadError::Placeholder { found: 2, .. }));
    }

    #[test]
    fn load_or_default_falls_back_on_bad_file() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("audit.yaml"), "name: x\ntemplate: nope\n").unwrap();
        let registry = load_or_default(Some(temp.path()));
        assert_eq!(registry.get(Operation::Audit).name(), "seo_audit");
    }

    #[test]
    fn load_uses_prompts_dir_env_when_dir_is_none() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("audit.yaml"),
            "name: env_audit\ntemplate: \"Audit: {{content}}\"\n",
        )
        .unwrap();
        let old = std::env::var("PROMPTS_DIR").ok();
        std::env::set_var("PROMPTS_DIR", temp.path());
        let registry = load(None).unwrap();
        assert_eq!(registry.get(Operation::Audit).name(), "env_audit");
        if let Some(v) = old {
            std::env::set_var("PROMPTS_DIR", v);
        } else {
            std::env::remove_var("PROMPTS_DIR");
        }
    }
}
