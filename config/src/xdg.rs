//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! ```toml
//! [env]
//! LLM_PROVIDER = "openai"
//! OPENAI_MODEL = "gpt-4o-mini"
//! FORM_MIN_CONTENT_CHARS = 80
//! ```
//!
//! Values may be strings, integers, floats or booleans; non-strings are applied in their
//! TOML text form. Tables and arrays are rejected.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// Path of the app's `config.toml`, whether or not it exists.
pub fn config_file_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| LoadError::XdgPath(e.to_string()))?;
    Ok(base.config_home().join(app_name).join("config.toml"))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, toml::Value>,
}

fn scalar_to_string(path: &str, key: &str, value: toml::Value) -> Result<String, LoadError> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(LoadError::XdgValue {
            path: path.to_string(),
            key: key.to_string(),
            found: other.type_str(),
        }),
    }
}

/// Env pairs from the `[env]` table. Missing file or section yields an empty map.
pub(crate) fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_file_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(&path).map_err(|source| LoadError::XdgRead {
        path: shown.clone(),
        source,
    })?;
    let config: ConfigFile = toml::from_str(&content).map_err(|source| LoadError::XdgParse {
        path: shown.clone(),
        source,
    })?;
    config
        .env
        .into_iter()
        .map(|(k, v)| scalar_to_string(&shown, &k, v).map(|s| (k, s)))
        .collect()
}
