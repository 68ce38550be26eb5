//! Error types for API document loading and request validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::message::ErrorCode;

/// The API document, a parameter declaration, or the validator
/// configuration is unusable. These indicate a deployment defect, not a
/// bad request.
#[derive(Debug, Error)]
pub enum SpecError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Document errors (exit code 2)
    #[error("invalid API document: {source}")]
    InvalidDocument {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported API document: expected `swagger: \"2.0\"` or `openapi: \"3.x\"`")]
    UnsupportedVersion,

    #[error("unresolved reference: {reference}")]
    UnresolvedRef { reference: String },

    #[error("unable to validate parameter {parameter} of type {kind} with format {format}")]
    UnsupportedFormat {
        parameter: String,
        kind: String,
        format: String,
    },

    #[error("parameter {parameter} declares an invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        parameter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SpecError::FileNotFound { .. } | SpecError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            SpecError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Outcome of a rejected request.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The request does not conform; carries the rendered messages in order.
    #[error("[{}]", errors.join(","))]
    Invalid { errors: Vec<String> },

    /// The path is known but declares no operation for this method.
    #[error("request method '{method}' not supported, allowed: {}", allowed.join(", "))]
    MethodNotSupported { method: String, allowed: Vec<String> },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

impl ValidateError {
    /// The single failure raised when the body cannot be read or parsed.
    pub fn unparseable_body() -> Self {
        ValidateError::Invalid {
            errors: vec![ErrorCode::Default.template().to_string()],
        }
    }

    /// Rendered messages for an `Invalid` failure, empty otherwise.
    pub fn errors(&self) -> &[String] {
        match self {
            ValidateError::Invalid { errors } => errors,
            _ => &[],
        }
    }

    /// Methods the path does declare, for a `MethodNotSupported` failure.
    pub fn allowed_methods(&self) -> &[String] {
        match self {
            ValidateError::MethodNotSupported { allowed, .. } => allowed,
            _ => &[],
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Invalid { .. } | ValidateError::MethodNotSupported { .. } => 1,
            ValidateError::Spec(e) => e.exit_code(),
        }
    }
}
