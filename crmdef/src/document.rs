use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure to read or parse a JSON/TOML document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported document format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
}

pub fn from_json_str<T: DeserializeOwned>(content: &str) -> Result<T, DocumentError> {
    Ok(serde_json::from_str(content)?)
}

pub fn from_toml_str<T: DeserializeOwned>(content: &str) -> Result<T, DocumentError> {
    Ok(toml::from_str(content)?)
}

/// Reads a document, choosing the parser from the file extension.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    log::debug!("parsing {} as {extension}", path.display());
    match extension.as_str() {
        "json" => from_json_str(&content),
        "toml" => from_toml_str(&content),
        other => Err(DocumentError::UnsupportedFormat(other.to_string())),
    }
}
