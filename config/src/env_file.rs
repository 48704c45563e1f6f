//! Project `.env` file: read into a key-value map. Nothing is applied here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `.env` in `override_dir` if given, else in the current directory; `None` when absent.
pub(crate) fn env_file_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Parses `.env` with the `dotenv` grammar (quotes, escapes, `export` prefix, comments).
/// A missing file yields an empty map; a malformed line is an error naming the file.
pub(crate) fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = env_file_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let to_err = |message: String| LoadError::Dotenv {
        path: path.display().to_string(),
        message,
    };
    let iter = ::dotenv::from_path_iter(&path).map_err(|e| to_err(e.to_string()))?;
    let mut out = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| to_err(e.to_string()))?;
        out.insert(key, value);
    }
    Ok(out)
}
