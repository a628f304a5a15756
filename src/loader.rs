//! Loading of API documents, engine configuration and callable descriptors.
//!
//! Documents come from files, strings or HTTP URLs; configuration and
//! callable descriptors from local JSON files.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::document::ApiDocument;
use crate::error::LoadError;
use crate::inference::{CallableDescriptor, CallableRegistry};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load an API document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if it isn't valid JSON, or
/// `LoadError::InvalidDocument` if it isn't shaped like an API document.
pub fn load_document(path: &Path) -> Result<ApiDocument, LoadError> {
    ApiDocument::new(read_json(path)?)
}

/// Load an API document from a JSON string.
pub fn load_document_str(content: &str) -> Result<ApiDocument, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    ApiDocument::new(value)
}

/// Load an API document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the body isn't
/// JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<ApiDocument, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    debug!(url, "fetching API document");
    let response = client.get(url).send().map_err(network)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network)?;
    let value: Value = response.json().map_err(network)?;
    ApiDocument::new(value)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load an API document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<ApiDocument, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Load engine configuration. Generator names are lower-cased.
///
/// # Errors
///
/// Returns `LoadError::InvalidConfig` if the file doesn't match the
/// configuration format.
pub fn load_config(path: &Path) -> Result<EngineConfig, LoadError> {
    let value = read_json(path)?;
    let config: EngineConfig =
        serde_json::from_value(value).map_err(|err| LoadError::InvalidConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    Ok(config.normalized())
}

#[derive(Deserialize)]
struct CallablesFile {
    callables: Vec<CallableDescriptor>,
}

/// Load callable descriptors:
///
/// ```json
/// { "callables": [{ "type": "UserSerializer", "field": "full_name", "returns": "str" }] }
/// ```
pub fn load_callables(path: &Path) -> Result<CallableRegistry, LoadError> {
    let value = read_json(path)?;
    let file: CallablesFile =
        serde_json::from_value(value).map_err(|err| LoadError::InvalidConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    debug!(count = file.callables.len(), path = %path.display(), "loaded callables");
    Ok(file.callables.into_iter().collect())
}

// --- Internal implementation ---

fn read_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}
