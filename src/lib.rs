//! OpenAPI Request Validator
//!
//! Validates incoming HTTP requests against an OpenAPI 3 or Swagger 2
//! document before they reach application code.
//!
//! A request is matched to a path template and operation, then checked in
//! stages: path parameters, query parameters, header parameters, and the
//! JSON body. The first stage with violations ends validation, and each
//! violation is rendered into a stable, human-readable message.
//!
//! # Example
//!
//! ```
//! use openapi_request_validator::{ApiSpec, Request, ValidateError, ValidationService};
//! use serde_json::json;
//!
//! let spec = ApiSpec::from_value(json!({
//!     "openapi": "3.0.0",
//!     "servers": [ { "url": "/api" } ],
//!     "paths": {
//!         "/pets": {
//!             "post": {
//!                 "requestBody": {
//!                     "required": true,
//!                     "content": {
//!                         "application/json": {
//!                             "schema": {
//!                                 "type": "object",
//!                                 "required": ["name"],
//!                                 "properties": {
//!                                     "name": { "type": "string" },
//!                                     "tag": { "type": "string", "enum": ["cat", "dog"] }
//!                                 }
//!                             }
//!                         }
//!                     }
//!                 }
//!             }
//!         }
//!     }
//! }))
//! .unwrap();
//! let service = ValidationService::new(spec);
//!
//! let request = Request::builder("POST", "/api/pets")
//!     .json(&json!({ "tag": "lizard" }))
//!     .build();
//!
//! match service.validate_request(&request) {
//!     Err(ValidateError::Invalid { errors }) => {
//!         assert_eq!(errors.len(), 2);
//!         assert!(errors.contains(&"The field name is mandatory".to_string()));
//!         let tag = "The field tag does not have the correct enum value";
//!         assert!(errors.contains(&tag.to_string()));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! # Error codes
//!
//! | Code | Name | Message |
//! |------|------|---------|
//! | 1028 | NOT_NULL | The %s %s is mandatory |
//! | 1029 | TYPE | The %s %s does not have the correct type |
//! | 1023 | PATTERN | The %s %s does not have the correct pattern |
//! | 1008 | ENUM | The %s %s does not have the correct enum value |
//! | 1013 / 1017 | MAX_LENGTH / MIN_LENGTH | The %s %s has an incorrect size |
//! | 1012 / 1016 | MAX_ITEMS / MIN_ITEMS | The %s %s has too many / too few items |
//! | 1015 | MIN_VALUE | The %s %s is below minimum allowed value |
//! | 1011 | MAX_VALUE | The %s %s is above maximum allowed value |
//! | 1031 | DUPLICATES | The %s %s does not allow duplicate values |
//! | 9001 | UNEXPECTED_BODY | No request body is expected but one was found |
//! | 9002 | MISSING_BODY | Request body is expected but not found |
//! | 9999 | DEFAULT | The payload could not be parsed |

mod config;
mod error;
mod loader;
mod message;
mod parameter;
mod path;
mod request;
mod schema;
mod service;
mod spec;
mod types;
mod validator;

pub use config::{load_config, PathExclusions, ValidatorConfig, DEFAULT_SCHEMA_LOCATION};
pub use error::{SpecError, ValidateError};
pub use loader::{is_url, load_document, load_document_auto, load_document_str, navigate_fragment};
pub use message::{message_for_code, render, ErrorCode, ValidationMessage};
pub use parameter::ParameterValidators;
pub use path::{find_matching_path, NormalizedPath};
pub use request::{IncomingRequest, Request, RequestBuilder};
pub use schema::{json_path, with_shared_schemas, SchemaValidator};
pub use service::{render_messages, ValidationService};
pub use spec::{is_json_media_type, ApiSpec, SpecVersion, HTTP_METHODS};
pub use types::{
    CollectionFormat, Operation, ParameterKind, ParameterLocation, ParameterSchema, ParameterSpec,
    RequestBodySpec, TypeMode,
};
pub use validator::{RequestValidator, Stage, StageReport};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
