//! API document loading from various sources.
//!
//! Handles loading OpenAPI/Swagger documents (JSON or YAML) from files,
//! strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::SpecError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load an API document from a file path.
///
/// # Errors
///
/// Returns `SpecError::FileNotFound` if the file doesn't exist,
/// or `SpecError::InvalidDocument` if it is neither JSON nor YAML.
pub fn load_document(path: &Path) -> Result<Value, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| SpecError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load an API document from a JSON or YAML string.
///
/// # Errors
///
/// Returns `SpecError::InvalidDocument` if the string can't be parsed.
pub fn load_document_str(content: &str) -> Result<Value, SpecError> {
    // JSON is a subset of YAML, so one parser covers both.
    serde_yaml::from_str(content).map_err(|source| SpecError::InvalidDocument { source })
}

/// Load an API document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `SpecError::NetworkError` if the request fails,
/// or `SpecError::InvalidDocument` if the response can't be parsed.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, SpecError> {
    let network_error = |source| SpecError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    load_document_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load an API document from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, SpecError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(SpecError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Navigate a local JSON Pointer fragment (e.g. `#/components/schemas/Pet`).
///
/// # Errors
///
/// Returns `SpecError::UnresolvedRef` for external references or
/// pointers that don't resolve within `document`.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value, SpecError> {
    let unresolved = || SpecError::UnresolvedRef {
        reference: fragment.to_string(),
    };

    let path = fragment.strip_prefix('#').ok_or_else(unresolved)?;
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(document);
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => current.get(&key),
        }
        .ok_or_else(unresolved)?;
    }
    Ok(current)
}
