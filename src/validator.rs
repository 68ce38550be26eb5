//! Request validation against a resolved operation.
//!
//! Stages run in a fixed order and stop at the first one reporting
//! violations: path parameters, query parameters, header parameters, body.
//! Parameter values are decoded exactly once before they are checked: path
//! segments here, query values by the request layer.

use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{SpecError, ValidateError};
use crate::message::{ErrorCode, ValidationMessage};
use crate::parameter::ParameterValidators;
use crate::path::NormalizedPath;
use crate::request::IncomingRequest;
use crate::schema::SchemaValidator;
use crate::spec::{is_json_media_type, ApiSpec};
use crate::types::{Operation, ParameterLocation, ParameterSpec, TypeMode};

/// Which part of the request a violation was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PathParameter,
    QueryParameter,
    HeaderParameter,
    Body,
}

impl Stage {
    /// Field kind used when rendering messages.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::PathParameter => ParameterLocation::Path.label(),
            Stage::QueryParameter => ParameterLocation::Query.label(),
            Stage::HeaderParameter => ParameterLocation::Header.label(),
            Stage::Body => "field",
        }
    }
}

/// Outcome of [`RequestValidator::validate_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// The failing stage; `None` when the request passed.
    pub stage: Option<Stage>,
    pub violations: Vec<ValidationMessage>,
}

impl StageReport {
    fn failed(stage: Stage, violations: Vec<ValidationMessage>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            debug!(stage = stage.label(), violations = violations.len(), "request stage failed");
            Some(Self {
                stage: Some(stage),
                violations,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks a request against one operation.
#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    schemas: SchemaValidator,
    parameters: ParameterValidators,
    skip_headers: bool,
}

impl RequestValidator {
    pub fn new(schemas: SchemaValidator) -> Self {
        Self {
            parameters: ParameterValidators::new(schemas.clone()),
            schemas,
            skip_headers: false,
        }
    }

    /// A validator resolving `$ref`s against `spec`.
    pub fn for_spec(spec: &ApiSpec) -> Self {
        Self::new(SchemaValidator::for_spec(spec))
    }

    /// Enable or disable the header parameter stage (on by default).
    pub fn validate_headers(mut self, enabled: bool) -> Self {
        self.skip_headers = !enabled;
        self
    }

    /// Run every stage in order, stopping at the first with violations.
    ///
    /// `request_path` must already have the base path removed so its
    /// segments line up with `operation.path`.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::Invalid` with the parse-failure message when
    /// the body can't be read or isn't JSON, and `ValidateError::Spec` when
    /// a parameter declaration is unusable.
    pub fn validate_request<R: IncomingRequest + ?Sized>(
        &self,
        request_path: &NormalizedPath,
        request: &R,
        operation: &Operation,
    ) -> Result<StageReport, ValidateError> {
        let path = self.validate_path_parameters(request_path, operation)?;
        if let Some(report) = StageReport::failed(Stage::PathParameter, path) {
            return Ok(report);
        }

        let query = self.validate_parameters(operation, ParameterLocation::Query, |name| {
            request.query_values(name)
        })?;
        if let Some(report) = StageReport::failed(Stage::QueryParameter, query) {
            return Ok(report);
        }

        if !self.skip_headers {
            let headers = self.validate_parameters(operation, ParameterLocation::Header, |name| {
                request.header_values(name)
            })?;
            if let Some(report) = StageReport::failed(Stage::HeaderParameter, headers) {
                return Ok(report);
            }
        }

        let body = self.validate_body(request, operation)?;
        Ok(StageReport::failed(Stage::Body, body).unwrap_or_default())
    }

    /// Every templated segment with a declared path parameter is checked;
    /// violations from all of them are collected.
    pub fn validate_path_parameters(
        &self,
        request_path: &NormalizedPath,
        operation: &Operation,
    ) -> Result<Vec<ValidationMessage>, SpecError> {
        let template = &operation.path;
        let mut violations = Vec::new();
        for index in 0..template.parts().len() {
            let Some(name) = template.param_name(index) else {
                continue;
            };
            let Some(parameter) = operation
                .parameters_in(ParameterLocation::Path)
                .find(|p| p.name.eq_ignore_ascii_case(name))
            else {
                continue;
            };
            let value = request_path.part(index).map(decode_path_value);
            violations.extend(self.parameters.validate(value.as_deref(), parameter)?);
        }
        Ok(violations)
    }

    /// Query or header parameters: each declared parameter is checked
    /// against every value sent for it, and all violations are collected.
    fn validate_parameters<F>(
        &self,
        operation: &Operation,
        location: ParameterLocation,
        values_for: F,
    ) -> Result<Vec<ValidationMessage>, SpecError>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut violations = Vec::new();
        for parameter in operation.parameters_in(location) {
            violations.extend(self.validate_values(&values_for(&parameter.name), parameter)?);
        }
        Ok(violations)
    }

    fn validate_values(
        &self,
        values: &[String],
        parameter: &ParameterSpec,
    ) -> Result<Vec<ValidationMessage>, SpecError> {
        if values.is_empty() {
            // Presence is checked for every type, including those without value rules.
            if parameter.required {
                return Ok(vec![ValidationMessage::new(ErrorCode::NotNull, &parameter.name)]);
            }
            return self.parameters.validate(None, parameter);
        }
        let mut violations = Vec::new();
        for value in values {
            violations.extend(self.parameters.validate(Some(value), parameter)?);
        }
        Ok(violations)
    }

    /// Body checks. Requests with a non-JSON content type are not inspected.
    pub fn validate_body<R: IncomingRequest + ?Sized>(
        &self,
        request: &R,
        operation: &Operation,
    ) -> Result<Vec<ValidationMessage>, ValidateError> {
        if let Some(content_type) = request.content_type() {
            if !is_json_media_type(&content_type) {
                debug!(content_type, "body not validated for non-JSON content type");
                return Ok(Vec::new());
            }
        }

        let body = read_json_body(request)?;
        let violations = match (&operation.request_body, body) {
            (None, None) => Vec::new(),
            (None, Some(_)) => vec![ValidationMessage::new(ErrorCode::UnexpectedBody, "body")],
            (Some(declared), None) if declared.required => {
                vec![ValidationMessage::new(ErrorCode::MissingBody, "body")]
            }
            (Some(_), None) => Vec::new(),
            (Some(declared), Some(body)) => match &declared.schema {
                Some(schema) => self.schemas.validate_with(&body, schema, TypeMode::Strict),
                None => Vec::new(),
            },
        };
        Ok(violations)
    }
}

/// Percent-decode a path segment, keeping the raw text when it isn't UTF-8.
fn decode_path_value(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            info!(value = raw, error = %e, "path parameter could not be decoded");
            raw.to_string()
        }
    }
}

/// `None` when no body was sent (empty or whitespace only).
fn read_json_body<R: IncomingRequest + ?Sized>(
    request: &R,
) -> Result<Option<Value>, ValidateError> {
    let bytes = request.read_body().map_err(|e| {
        info!(error = %e, "request body could not be read");
        ValidateError::unparseable_body()
    })?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        info!(error = %e, "request body is not valid JSON");
        ValidateError::unparseable_body()
    })
}
