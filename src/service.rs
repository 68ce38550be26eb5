//! The outermost validation boundary.
//!
//! Finds the operation for a request, runs the [`RequestValidator`], and
//! turns any violations into rendered messages carried by
//! [`ValidateError::Invalid`].

use tracing::debug;

use crate::config::{PathExclusions, ValidatorConfig};
use crate::error::{SpecError, ValidateError};
use crate::message::{message_for_code, render, ValidationMessage};
use crate::path::{find_matching_path, NormalizedPath};
use crate::request::IncomingRequest;
use crate::spec::ApiSpec;
use crate::types::Operation;
use crate::validator::{RequestValidator, Stage};

/// Validates requests against one API document.
///
/// Build once at startup and share; validation takes `&self`.
///
/// ```
/// use openapi_request_validator::{ApiSpec, Request, ValidationService};
/// use serde_json::json;
///
/// let spec = ApiSpec::from_value(json!({
///     "openapi": "3.0.0",
///     "paths": {
///         "/pets/{id}": {
///             "get": {
///                 "parameters": [
///                     {
///                         "name": "id",
///                         "in": "path",
///                         "required": true,
///                         "schema": { "type": "integer" }
///                     }
///                 ]
///             }
///         }
///     }
/// }))
/// .unwrap();
/// let service = ValidationService::new(spec);
///
/// assert!(service.validate_request(&Request::builder("GET", "/pets/7").build()).is_ok());
///
/// let err = service
///     .validate_request(&Request::builder("GET", "/pets/seven").build())
///     .unwrap_err();
/// assert_eq!(err.errors(), ["The path parameter id does not have the correct type"]);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationService {
    spec: ApiSpec,
    validator: RequestValidator,
    exclusions: PathExclusions,
}

impl ValidationService {
    pub fn new(spec: ApiSpec) -> Self {
        Self {
            validator: RequestValidator::for_spec(&spec),
            spec,
            exclusions: PathExclusions::default(),
        }
    }

    /// Apply `config` to an already loaded document. `schema-location` is
    /// not consulted.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::InvalidPattern` for an unusable exclusion pattern.
    pub fn with_config(spec: ApiSpec, config: &ValidatorConfig) -> Result<Self, SpecError> {
        let spec = match &config.base_path {
            Some(base_path) => spec.with_base_path(Some(base_path.clone())),
            None => spec,
        };
        Ok(Self {
            validator: RequestValidator::for_spec(&spec).validate_headers(config.validate_headers),
            exclusions: PathExclusions::new(&config.exclude_path_patterns)?,
            spec,
        })
    }

    /// Load the document named by `schema-location` and apply `config`.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, SpecError> {
        Self::with_config(ApiSpec::load(&config.schema_location)?, config)
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    /// Find the operation a request targets.
    ///
    /// Returns `Ok(None)` for paths the document doesn't declare.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::MethodNotSupported` when the path is declared
    /// without an operation for `method`.
    pub fn resolve_operation(
        &self,
        request_path: &NormalizedPath,
        method: &str,
    ) -> Result<Option<Operation>, ValidateError> {
        let Some(template) = find_matching_path(&self.spec, request_path) else {
            return Ok(None);
        };
        match self.spec.operation(&template, method)? {
            Some(operation) => Ok(Some(operation)),
            None => {
                let allowed = self.spec.methods(template.original());
                debug!(
                    template = template.original(),
                    method,
                    ?allowed,
                    "method not declared for path"
                );
                Err(ValidateError::MethodNotSupported {
                    method: method.to_ascii_uppercase(),
                    allowed,
                })
            }
        }
    }

    /// Validate `request`, succeeding silently when it conforms or its path
    /// is unknown or excluded.
    ///
    /// # Errors
    ///
    /// - `ValidateError::Invalid` with one rendered message per violation
    /// - `ValidateError::MethodNotSupported` for an undeclared method
    /// - `ValidateError::Spec` when the document itself is unusable
    pub fn validate_request<R: IncomingRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<(), ValidateError> {
        if self.exclusions.is_excluded(request.path()) {
            debug!(path = request.path(), "path excluded from validation");
            return Ok(());
        }

        let request_path = NormalizedPath::with_base_path(request.path(), self.spec.base_path());
        let Some(operation) = self.resolve_operation(&request_path, request.method())? else {
            return Ok(());
        };

        let report = self.validator.validate_request(&request_path, request, &operation)?;
        match report.stage {
            Some(stage) if !report.is_valid() => Err(ValidateError::Invalid {
                errors: render_messages(stage, &report.violations),
            }),
            _ => Ok(()),
        }
    }
}

/// Render violations with their stage label.
pub fn render_messages(stage: Stage, violations: &[ValidationMessage]) -> Vec<String> {
    violations
        .iter()
        .map(|message| {
            render(
                message_for_code(&message.code),
                stage.label(),
                display_field(message.field()),
            )
        })
        .collect()
}

/// `$.details.code` reads as `details.code`.
fn display_field(field: &str) -> &str {
    match field.rfind("$.") {
        Some(idx) => &field[idx + 2..],
        None => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ErrorCode;
    use crate::request::Request;
    use serde_json::json;

    fn spec() -> ApiSpec {
        ApiSpec::from_value(json!({
            "swagger": "2.0",
            "basePath": "/api",
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [
                            {
                                "name": "limit",
                                "in": "query",
                                "type": "integer",
                                "format": "int32",
                                "minimum": 1
                            }
                        ]
                    },
                    "post": {
                        "parameters": [
                            {
                                "name": "pet",
                                "in": "body",
                                "required": true,
                                "schema": { "$ref": "#/definitions/Pet" }
                            }
                        ]
                    }
                },
                "/pets/{id}": {
                    "get": {
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "type": "integer" }
                        ]
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn unknown_path_is_skipped() {
        let service = ValidationService::new(spec());
        let request = Request::builder("GET", "/api/owners/1").build();
        assert!(service.validate_request(&request).is_ok());
    }

    #[test]
    fn unknown_method_on_known_path() {
        let service = ValidationService::new(spec());
        let request = Request::builder("head", "/api/pets").build();
        match service.validate_request(&request) {
            Err(ValidateError::MethodNotSupported { method, allowed }) => {
                assert_eq!(method, "HEAD");
                assert_eq!(allowed, ["GET", "POST"]);
            }
            other => panic!("expected MethodNotSupported, got {other:?}"),
        }
    }

    #[test]
    fn base_path_is_stripped_before_matching() {
        let service = ValidationService::new(spec());
        let err = service
            .validate_request(&Request::builder("GET", "/api/pets/abc").build())
            .unwrap_err();
        assert_eq!(err.errors(), ["The path parameter id does not have the correct type"]);
    }

    #[test]
    fn query_messages_rendered() {
        let service = ValidationService::new(spec());
        let err = service
            .validate_request(&Request::builder("GET", "/api/pets?limit=0").build())
            .unwrap_err();
        assert_eq!(err.errors(), ["The query parameter limit is below minimum allowed value"]);
    }

    #[test]
    fn body_messages_rendered() {
        let service = ValidationService::new(spec());
        let err = service
            .validate_request(&Request::builder("POST", "/api/pets").json(&json!({})).build())
            .unwrap_err();
        assert_eq!(err.errors(), ["The field name is mandatory"]);

        let err = service
            .validate_request(&Request::builder("POST", "/api/pets").build())
            .unwrap_err();
        assert_eq!(err.errors(), ["Request body is expected but not found"]);
    }

    #[test]
    fn excluded_paths_are_skipped() {
        let config = ValidatorConfig {
            exclude_path_patterns: vec!["/api/pets/**".into()],
            ..Default::default()
        };
        let service = ValidationService::with_config(spec(), &config).unwrap();
        assert!(service
            .validate_request(&Request::builder("GET", "/api/pets/abc").build())
            .is_ok());
    }

    #[test]
    fn configured_base_path_overrides_document() {
        let config = ValidatorConfig {
            base_path: Some("/v2".into()),
            ..Default::default()
        };
        let service = ValidationService::with_config(spec(), &config).unwrap();
        assert_eq!(service.spec().base_path(), Some("/v2"));
        assert!(service
            .validate_request(&Request::builder("GET", "/v2/pets/abc").build())
            .is_err());
    }

    #[test]
    fn display_field_strips_json_path_prefix() {
        assert_eq!(display_field("$.details.code"), "details.code");
        assert_eq!(display_field("id"), "id");
        assert_eq!(display_field("ids[0]"), "ids[0]");
    }

    #[test]
    fn render_uses_field_before_colon() {
        let mut message = ValidationMessage::new(ErrorCode::Enum, "tag");
        message.path = "$.tag: does not have a value in the enumeration".into();
        assert_eq!(
            render_messages(Stage::Body, &[message]),
            ["The field tag does not have the correct enum value"]
        );
    }
}
