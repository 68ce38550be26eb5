//! Validator configuration.
//!
//! Read from a YAML or JSON file with kebab-case keys:
//!
//! ```yaml
//! schema-location: https://api.example.com/openapi.yaml
//! base-path: /v1
//! exclude-path-patterns:
//!   - /health
//!   - /internal/**
//! validate-headers: false
//! ```

use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::SpecError;

/// Default API document location.
pub const DEFAULT_SCHEMA_LOCATION: &str = "swagger.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// File path or http(s) URL of the API document.
    pub schema_location: String,
    /// Overrides the base path declared by the document.
    pub base_path: Option<String>,
    /// Ant-style patterns for request paths that are never validated.
    pub exclude_path_patterns: Vec<String>,
    pub validate_headers: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            schema_location: DEFAULT_SCHEMA_LOCATION.to_string(),
            base_path: None,
            exclude_path_patterns: Vec::new(),
            validate_headers: true,
        }
    }
}

/// Load a configuration file. An empty file yields the defaults.
///
/// # Errors
///
/// Returns `SpecError::FileNotFound`, `SpecError::ReadError`, or
/// `SpecError::InvalidConfig` for unknown keys and malformed content.
pub fn load_config(path: &Path) -> Result<ValidatorConfig, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(ValidatorConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| SpecError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiled `exclude-path-patterns`.
#[derive(Debug, Clone, Default)]
pub struct PathExclusions {
    patterns: Vec<Regex>,
}

impl PathExclusions {
    /// # Errors
    ///
    /// Returns `SpecError::InvalidPattern` if a pattern cannot be compiled.
    pub fn new(patterns: &[String]) -> Result<Self, SpecError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&ant_to_regex(pattern)).map_err(|source| SpecError::InvalidPattern {
                    parameter: "exclude-path-patterns".to_string(),
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translate an Ant path pattern into an anchored regex.
///
/// `**` spans segments, `*` stays within one, `?` is a single non-slash
/// character. A trailing `/**` also matches the bare prefix.
fn ant_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut rest = pattern;
    while !rest.is_empty() {
        if rest == "/**" {
            out.push_str("(?:/.*)?");
            break;
        }
        if let Some(tail) = rest.strip_prefix("/**/") {
            out.push_str("(?:/.*)?/");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            out.push_str("[^/]*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('?') {
            out.push_str("[^/]");
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            }
            rest = chars.as_str();
        }
    }
    out.push('$');
    out
}
