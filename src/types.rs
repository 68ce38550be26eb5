//! Core types describing operations and their parameters.

use serde_json::Value;

use crate::path::NormalizedPath;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    /// Parse an `in` value. Returns `None` for locations this crate does
    /// not validate (`body`, `formData`, `cookie`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            _ => None,
        }
    }

    /// Label used when rendering violation messages.
    pub fn label(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path parameter",
            ParameterLocation::Query => "query parameter",
            ParameterLocation::Header => "header parameter",
        }
    }
}

/// How an array parameter value is split into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    /// Values arrive pre-split; the raw value is a single element.
    Multi,
}

impl CollectionFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "tsv" => Some(CollectionFormat::Tsv),
            "pipes" => Some(CollectionFormat::Pipes),
            "multi" => Some(CollectionFormat::Multi),
            _ => None,
        }
    }

    pub fn separator(&self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }

    /// Split a raw value into its elements. Trailing empty elements are
    /// dropped.
    pub fn split<'a>(&self, value: &'a str) -> Vec<&'a str> {
        match self.separator() {
            Some(sep) => {
                let mut items: Vec<&str> = value.split(sep).collect();
                while items.last().is_some_and(|s| s.is_empty()) {
                    items.pop();
                }
                items
            }
            None => vec![value],
        }
    }
}

/// Declared primitive type of a parameter, used to pick its validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Array,
    /// Any type without parameter-level rules (boolean, object, absent).
    Other,
}

impl ParameterKind {
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("string") => ParameterKind::String,
            Some("integer") => ParameterKind::Integer,
            Some("number") => ParameterKind::Number,
            Some("array") => ParameterKind::Array,
            _ => ParameterKind::Other,
        }
    }
}

/// Type, format and constraints of a parameter, flattened from either
/// Swagger 2 inline declarations or an OpenAPI 3 `schema`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    pub type_name: Option<String>,
    pub format: Option<String>,
    /// Allowed values, compared against raw strings.
    pub enumeration: Vec<String>,
    pub pattern: Option<String>,
    /// String length bounds, in characters.
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// The bound itself is rejected when set.
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub collection_format: CollectionFormat,
    /// JSON schema applied to each element of an array parameter.
    pub items: Option<Value>,
}

impl ParameterSchema {
    pub fn kind(&self) -> ParameterKind {
        ParameterKind::parse(self.type_name.as_deref())
    }
}

/// A declared path, query or header parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: ParameterSchema,
}

impl ParameterSpec {
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        schema: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParameterLocation::Path,
            schema,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Declared request body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub required: bool,
    /// JSON content schema; `None` when no JSON media type is declared.
    pub schema: Option<Value>,
}

/// A resolved path template + method with its declarations.
#[derive(Debug, Clone)]
pub struct Operation {
    pub path: NormalizedPath,
    pub method: String,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
}

impl Operation {
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

/// How the schema engine treats primitive values that arrive as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeMode {
    /// Numeric and boolean strings are accepted where those types are
    /// expected, and a lone value where an array is expected.
    #[default]
    Loose,
    Strict,
}
