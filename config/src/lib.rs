//! Load configuration from XDG `config.toml` and the project `.env`, then apply it to the
//! process environment with priority: **existing env > .env > XDG**.
//!
//! Binaries call [`load_and_apply`] once at start-up, before any settings are read; typed
//! settings (`LlmSettings::from_env`, `ContentBounds::from_env`, `ServeConfig::from_env`)
//! then see the merged environment.

mod env_file;
mod xdg;

pub use xdg::config_file_path;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read {path}: {source}")]
    XdgRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    XdgParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{path}: [env] {key} must be a string, number or boolean (found {found})")]
    XdgValue {
        path: String,
        key: String,
        found: &'static str,
    },
    #[error("read {path}: {message}")]
    Dotenv { path: String, message: String },
}

/// Where an applied value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    DotEnv,
    Xdg,
}

/// Keys set by [`load_and_apply`], sorted, with their source. Values are not kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub keys: BTreeMap<String, Source>,
}

impl Applied {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn source_of(&self, key: &str) -> Option<Source> {
        self.keys.get(key).copied()
    }
}

/// Loads `config.toml` `[env]` and `.env`, then sets only the keys that are **not** already
/// in the environment.
///
/// When a key is missing from the process environment:
/// 1. the value from `.env` (in `override_dir`, else the current directory) wins;
/// 2. otherwise the value from `$XDG_CONFIG_HOME/<app_name>/config.toml` is used.
///
/// * `app_name`: `"seolens"` for the binaries.
/// * `override_dir`: directory holding `.env` instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<Applied, LoadError> {
    let xdg_map = xdg::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    let mut applied = Applied::default();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        let chosen = match (dotenv_map.get(key), xdg_map.get(key)) {
            (Some(v), _) => Some((v, Source::DotEnv)),
            (None, Some(v)) => Some((v, Source::Xdg)),
            (None, None) => None,
        };
        if let Some((value, source)) = chosen {
            std::env::set_var(key, value);
            applied.keys.insert(key.clone(), source);
        }
    }
    Ok(applied)
}
