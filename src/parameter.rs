//! Validation of single string values against parameter declarations.
//!
//! Every parameter value arrives as a string, already decoded by the
//! request layer. The declared type picks one of four rule sets; the
//! required and enum checks shared by the primitive types run first,
//! before any type-specific rule.

use std::collections::HashSet;

use regex::Regex;
use serde_json::json;

use crate::error::SpecError;
use crate::message::{ErrorCode, ValidationMessage};
use crate::schema::SchemaValidator;
use crate::types::{ParameterKind, ParameterSpec};

/// Dispatches parameter values to the validator for their declared type.
#[derive(Debug, Clone, Default)]
pub struct ParameterValidators {
    schema_validator: SchemaValidator,
}

impl ParameterValidators {
    /// Array items are checked with `schema_validator`.
    pub fn new(schema_validator: SchemaValidator) -> Self {
        Self { schema_validator }
    }

    /// Validate `value` against `parameter`.
    ///
    /// Parameters of a type without parameter-level rules always pass.
    ///
    /// # Errors
    ///
    /// Returns a `SpecError` when the declaration itself is unusable: an
    /// integer/number format other than int32/int64/float/double, or a
    /// pattern that isn't a valid regular expression.
    pub fn validate(
        &self,
        value: Option<&str>,
        parameter: &ParameterSpec,
    ) -> Result<Vec<ValidationMessage>, SpecError> {
        let kind = parameter.schema.kind();
        if kind == ParameterKind::Array {
            return Ok(self.validate_array(value, parameter));
        }
        if kind == ParameterKind::Other {
            return Ok(Vec::new());
        }

        let value = match precheck(value, parameter) {
            Precheck::Done(messages) => return Ok(messages),
            Precheck::Continue(value) => value,
        };
        if !matches_enum(value, parameter) {
            return Ok(vec![ValidationMessage::new(ErrorCode::Enum, &parameter.name)]);
        }

        match kind {
            ParameterKind::String => validate_string(value, parameter),
            ParameterKind::Integer => validate_integer(value, parameter),
            ParameterKind::Number => validate_number(value, parameter),
            ParameterKind::Array | ParameterKind::Other => Ok(Vec::new()),
        }
    }

    fn validate_array(
        &self,
        value: Option<&str>,
        parameter: &ParameterSpec,
    ) -> Vec<ValidationMessage> {
        let value = match precheck(value, parameter) {
            Precheck::Done(messages) => return messages,
            Precheck::Continue(value) => value,
        };
        let schema = &parameter.schema;
        let values = schema.collection_format.split(value);
        let fail = |code| vec![ValidationMessage::new(code, &parameter.name)];

        if schema.max_items.is_some_and(|max| values.len() as u64 > max) {
            return fail(ErrorCode::MaxItems);
        }
        if schema.min_items.is_some_and(|min| (values.len() as u64) < min) {
            return fail(ErrorCode::MinItems);
        }
        if schema.unique_items && values.iter().collect::<HashSet<_>>().len() != values.len() {
            return fail(ErrorCode::Duplicates);
        }
        if !schema.enumeration.is_empty()
            && values
                .iter()
                .any(|v| !schema.enumeration.iter().any(|e| e == v))
        {
            return fail(ErrorCode::Enum);
        }

        let items = schema.items.clone().unwrap_or_else(|| json!({}));
        let mut messages: Vec<ValidationMessage> = Vec::new();
        for item in values {
            for mut message in self.schema_validator.validate(item, &items) {
                // Item paths are relative to the element; report them on the parameter.
                if let Some(rest) = message.path.strip_prefix('$') {
                    message.path = format!("{}{rest}", parameter.name);
                }
                if !messages
                    .iter()
                    .any(|m| m.code == message.code && m.path == message.path)
                {
                    messages.push(message);
                }
            }
        }
        messages
    }
}

enum Precheck<'a> {
    Done(Vec<ValidationMessage>),
    Continue(&'a str),
}

/// Required / blank handling shared by every parameter type.
fn precheck<'a>(value: Option<&'a str>, parameter: &ParameterSpec) -> Precheck<'a> {
    match value {
        Some(v) if !v.trim().is_empty() => Precheck::Continue(v),
        _ if parameter.required => {
            Precheck::Done(vec![ValidationMessage::new(ErrorCode::NotNull, &parameter.name)])
        }
        _ => Precheck::Done(Vec::new()),
    }
}

fn matches_enum(value: &str, parameter: &ParameterSpec) -> bool {
    let allowed = &parameter.schema.enumeration;
    allowed.is_empty() || allowed.iter().any(|e| e == value)
}

fn validate_string(
    value: &str,
    parameter: &ParameterSpec,
) -> Result<Vec<ValidationMessage>, SpecError> {
    let schema = &parameter.schema;
    let length = value.chars().count() as u64;
    if schema.max_length.is_some_and(|max| length > max) {
        return Ok(vec![ValidationMessage::new(ErrorCode::MaxLength, &parameter.name)]);
    }
    if schema.min_length.is_some_and(|min| length < min) {
        return Ok(vec![ValidationMessage::new(ErrorCode::MinLength, &parameter.name)]);
    }

    let Some(pattern) = schema.pattern.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(Vec::new());
    };
    // The whole value must match, not just a substring.
    let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
        SpecError::InvalidPattern {
            parameter: parameter.name.clone(),
            pattern: pattern.to_string(),
            source,
        }
    })?;
    if regex.is_match(value) {
        Ok(Vec::new())
    } else {
        Ok(vec![ValidationMessage::new(ErrorCode::Pattern, &parameter.name)])
    }
}

fn validate_integer(
    value: &str,
    parameter: &ParameterSpec,
) -> Result<Vec<ValidationMessage>, SpecError> {
    let format = parameter.schema.format.as_deref().unwrap_or("int64");
    let parsed = if format.eq_ignore_ascii_case("int32") {
        value.parse::<i32>().ok().map(i64::from)
    } else if format.eq_ignore_ascii_case("int64") {
        value.parse::<i64>().ok()
    } else {
        return Err(unsupported_format(parameter, format));
    };
    let Some(n) = parsed else {
        return Ok(vec![ValidationMessage::new(ErrorCode::Type, &parameter.name)]);
    };
    Ok(check_bounds(n as f64, parameter))
}

fn validate_number(
    value: &str,
    parameter: &ParameterSpec,
) -> Result<Vec<ValidationMessage>, SpecError> {
    let format = parameter.schema.format.as_deref().unwrap_or("double");
    let parsed = if format.eq_ignore_ascii_case("float") {
        value.parse::<f32>().ok().map(f64::from)
    } else if format.eq_ignore_ascii_case("double") {
        value.parse::<f64>().ok()
    } else {
        return Err(unsupported_format(parameter, format));
    };
    // "NaN", "inf" and out-of-range literals are not JSON numbers.
    let Some(n) = parsed.filter(|n| n.is_finite()) else {
        return Ok(vec![ValidationMessage::new(ErrorCode::Type, &parameter.name)]);
    };
    Ok(check_bounds(n, parameter))
}

/// Minimum/maximum check, inclusive unless the bound is marked exclusive.
fn check_bounds(n: f64, parameter: &ParameterSpec) -> Vec<ValidationMessage> {
    let schema = &parameter.schema;
    let below = |min: f64| if schema.exclusive_minimum { n <= min } else { n < min };
    let above = |max: f64| if schema.exclusive_maximum { n >= max } else { n > max };
    if schema.minimum.is_some_and(below) {
        return vec![ValidationMessage::new(ErrorCode::MinValue, &parameter.name)];
    }
    if schema.maximum.is_some_and(above) {
        return vec![ValidationMessage::new(ErrorCode::MaxValue, &parameter.name)];
    }
    Vec::new()
}

fn unsupported_format(parameter: &ParameterSpec, format: &str) -> SpecError {
    SpecError::UnsupportedFormat {
        parameter: parameter.name.clone(),
        kind: parameter.schema.type_name.clone().unwrap_or_default(),
        format: format.to_string(),
    }
}
