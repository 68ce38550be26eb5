//! Schema validation of values against JSON-schema fragments.
//!
//! Wraps the `jsonschema` engine. Fragments taken from an API document
//! are combined with the document's shared schemas so local `$ref`s
//! resolve, and every engine failure is reported as a violation rather
//! than an error.

use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError};
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::warn;

use crate::message::{ErrorCode, ValidationMessage};
use crate::spec::ApiSpec;
use crate::types::TypeMode;

/// Nesting limit when following `$ref`s during loose coercion.
const MAX_REF_DEPTH: usize = 32;

/// Validates values against schema fragments from one API document.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    shared: Option<(&'static str, Arc<Value>)>,
    draft: Draft,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    /// A validator with no API document; local `$ref`s won't resolve.
    pub fn new() -> Self {
        Self {
            shared: None,
            draft: Draft::Draft4,
        }
    }

    /// A validator that resolves `$ref`s against the document's
    /// `definitions` (Swagger 2) or `components` (OpenAPI 3).
    pub fn for_spec(spec: &ApiSpec) -> Self {
        Self {
            shared: spec
                .shared_schemas()
                .map(|(field, schemas)| (field, Arc::new(schemas.clone()))),
            draft: spec.version().draft(),
        }
    }

    /// Validate with loose typing.
    pub fn validate<T: Serialize + ?Sized>(
        &self,
        value: &T,
        schema: &Value,
    ) -> Vec<ValidationMessage> {
        self.validate_with(value, schema, TypeMode::Loose)
    }

    /// Validate `value` against `schema`.
    ///
    /// Schema compilation and serialization failures come back as a single
    /// DEFAULT violation.
    pub fn validate_with<T: Serialize + ?Sized>(
        &self,
        value: &T,
        schema: &Value,
        mode: TypeMode,
    ) -> Vec<ValidationMessage> {
        let combined = match &self.shared {
            Some((field, shared)) => with_shared_schemas(schema, field, shared),
            None => schema.clone(),
        };

        let instance = match serde_json::to_value(value) {
            Ok(instance) => instance,
            Err(e) => {
                warn!(error = %e, "value could not be serialized for schema validation");
                return vec![engine_failure()];
            }
        };
        let instance = match mode {
            TypeMode::Loose => coerce_loose(instance, &combined, &combined, 0),
            TypeMode::Strict => instance,
        };

        let validator = match jsonschema::options().with_draft(self.draft).build(&combined) {
            Ok(validator) => validator,
            Err(e) => {
                warn!(error = %e, "schema fragment could not be compiled");
                return vec![engine_failure()];
            }
        };

        validator.iter_errors(&instance).map(|e| to_message(&e)).collect()
    }
}

/// Copy `schema` with the shared schemas attached under `field`.
///
/// The fragment itself is never modified; non-object fragments are
/// returned as-is.
pub fn with_shared_schemas(schema: &Value, field: &str, shared: &Value) -> Value {
    let mut combined = schema.clone();
    if let Value::Object(map) = &mut combined {
        map.insert(field.to_string(), shared.clone());
    }
    combined
}

fn engine_failure() -> ValidationMessage {
    ValidationMessage::new(ErrorCode::Default, "")
}

fn to_message(error: &ValidationError<'_>) -> ValidationMessage {
    let code = match &error.kind {
        ValidationErrorKind::Required { .. } => ErrorCode::NotNull,
        ValidationErrorKind::Type { .. } => ErrorCode::Type,
        ValidationErrorKind::Pattern { .. } => ErrorCode::Pattern,
        ValidationErrorKind::Enum { .. } => ErrorCode::Enum,
        ValidationErrorKind::MaxLength { .. } => ErrorCode::MaxLength,
        ValidationErrorKind::MinLength { .. } => ErrorCode::MinLength,
        ValidationErrorKind::MaxItems { .. } => ErrorCode::MaxItems,
        ValidationErrorKind::MinItems { .. } => ErrorCode::MinItems,
        ValidationErrorKind::Minimum { .. } | ValidationErrorKind::ExclusiveMinimum { .. } => {
            ErrorCode::MinValue
        }
        ValidationErrorKind::Maximum { .. } | ValidationErrorKind::ExclusiveMaximum { .. } => {
            ErrorCode::MaxValue
        }
        ValidationErrorKind::UniqueItems { .. } => ErrorCode::Duplicates,
        _ => ErrorCode::Default,
    };

    let mut field = json_path(&error.instance_path.to_string());
    if let ValidationErrorKind::Required { property } = &error.kind {
        match property {
            Value::String(name) => field = format!("{field}.{name}"),
            other => field = format!("{field}.{other}"),
        }
    }

    ValidationMessage {
        code: code.code().to_string(),
        path: field,
        arguments: vec![error.to_string()],
    }
}

/// Convert a JSON Pointer (`/details/tags/0`) to a `$.details.tags[0]` path.
pub fn json_path(pointer: &str) -> String {
    let mut out = String::from("$");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push('[');
            out.push_str(&segment);
            out.push(']');
        } else {
            out.push('.');
            out.push_str(&segment);
        }
    }
    out
}

/// Rewrite string primitives into the types `schema` expects, where the
/// string parses as that type. Values that don't parse are left alone so
/// the engine reports them.
fn coerce_loose(instance: Value, schema: &Value, root: &Value, depth: usize) -> Value {
    if depth > MAX_REF_DEPTH {
        return instance;
    }
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return match reference.strip_prefix('#').and_then(|p| root.pointer(p)) {
            Some(target) => coerce_loose(instance, target, root, depth + 1),
            None => instance,
        };
    }

    let mut instance = instance;
    if let Some(all_of) = schema.get("allOf").and_then(Value::as_array) {
        for member in all_of {
            instance = coerce_loose(instance, member, root, depth + 1);
        }
    }

    match schema.get("type").and_then(Value::as_str) {
        Some("integer") => match &instance {
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).unwrap_or(instance),
            _ => instance,
        },
        Some("number") => match &instance {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(instance),
            _ => instance,
        },
        Some("boolean") => match &instance {
            Value::String(s) if s == "true" => Value::Bool(true),
            Value::String(s) if s == "false" => Value::Bool(false),
            _ => instance,
        },
        Some("array") => {
            let items = schema.get("items");
            let elements = match instance {
                Value::Array(elements) => elements,
                Value::Null => return Value::Null,
                single => vec![single],
            };
            Value::Array(
                elements
                    .into_iter()
                    .map(|e| match items {
                        Some(items) => coerce_loose(e, items, root, depth + 1),
                        None => e,
                    })
                    .collect(),
            )
        }
        Some("object") => match (instance, schema.get("properties").and_then(Value::as_object)) {
            (Value::Object(mut fields), Some(properties)) => {
                for (key, property) in properties {
                    if let Some(value) = fields.remove(key) {
                        fields.insert(key.clone(), coerce_loose(value, property, root, depth + 1));
                    }
                }
                Value::Object(fields)
            }
            (instance, _) => instance,
        },
        _ => instance,
    }
}
