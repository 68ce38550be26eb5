//! Navigable view over a parsed OpenAPI 3 or Swagger 2 document.
//!
//! The document is kept as JSON and read on demand. Operations and their
//! parameters are flattened into the version-independent types from
//! [`crate::types`], so the validators never see which dialect a
//! declaration came from.

use std::sync::Arc;

use jsonschema::Draft;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SpecError;
use crate::loader::navigate_fragment;
use crate::path::NormalizedPath;
use crate::types::{
    CollectionFormat, Operation, ParameterLocation, ParameterSchema, ParameterSpec,
    RequestBodySpec,
};

/// HTTP methods that may key an operation inside a path item.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

static NO_SCHEMA: Value = Value::Null;

/// Dialect of the loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger2,
    OpenApi30,
    OpenApi31,
}

impl SpecVersion {
    fn detect(document: &Value) -> Option<Self> {
        let version = |key: &str| {
            document.get(key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        };
        if let Some(v) = version("openapi") {
            if v.starts_with("3.1") {
                return Some(SpecVersion::OpenApi31);
            }
            if v.starts_with('3') {
                return Some(SpecVersion::OpenApi30);
            }
            return None;
        }
        match version("swagger").as_deref() {
            Some("2.0") | Some("2") => Some(SpecVersion::Swagger2),
            _ => None,
        }
    }

    /// Field under which shared schemas live at the document root.
    pub fn shared_schemas_field(&self) -> &'static str {
        match self {
            SpecVersion::Swagger2 => "definitions",
            SpecVersion::OpenApi30 | SpecVersion::OpenApi31 => "components",
        }
    }

    /// JSON-schema dialect used by schema objects in this version.
    pub fn draft(&self) -> Draft {
        match self {
            SpecVersion::Swagger2 | SpecVersion::OpenApi30 => Draft::Draft4,
            SpecVersion::OpenApi31 => Draft::Draft202012,
        }
    }
}

/// A loaded API document. Immutable after construction and cheap to
/// clone; safe to share across threads.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    document: Arc<Value>,
    version: SpecVersion,
    base_path: Option<String>,
}

impl ApiSpec {
    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::UnsupportedVersion` when the document declares
    /// neither `swagger: "2.0"` nor `openapi: "3.x"`.
    pub fn from_value(document: Value) -> Result<Self, SpecError> {
        let version = SpecVersion::detect(&document).ok_or(SpecError::UnsupportedVersion)?;
        let base_path = derive_base_path(&document, version);
        Ok(Self {
            document: Arc::new(document),
            version,
            base_path,
        })
    }

    /// Load and wrap a document from a file path or URL.
    pub fn load(location: &str) -> Result<Self, SpecError> {
        Self::from_value(crate::loader::load_document_auto(location)?)
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Prefix stripped from request paths before matching.
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Replace the base path derived from the document.
    pub fn with_base_path(mut self, base_path: Option<String>) -> Self {
        self.base_path = base_path.and_then(|p| clean_base_path(&p));
        self
    }

    /// Path templates in document order.
    pub fn path_templates(&self) -> impl Iterator<Item = &str> {
        self.paths().into_iter().flat_map(|paths| paths.keys().map(String::as_str))
    }

    /// Upper-case methods declared for a template, in document order.
    pub fn methods(&self, template: &str) -> Vec<String> {
        self.path_item(template)
            .map(|item| {
                item.keys()
                    .filter(|k| HTTP_METHODS.contains(&k.to_ascii_lowercase().as_str()))
                    .map(|k| k.to_ascii_uppercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Shared schema field name and fragment for `$ref` resolution.
    pub fn shared_schemas(&self) -> Option<(&'static str, &Value)> {
        let field = self.version.shared_schemas_field();
        self.document.get(field).map(|v| (field, v))
    }

    /// Resolve the operation for `method` under a matched template.
    ///
    /// Returns `Ok(None)` when the template declares no such method.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::UnresolvedRef` when a parameter, schema or
    /// request body `$ref` cannot be followed.
    pub fn operation(
        &self,
        template: &NormalizedPath,
        method: &str,
    ) -> Result<Option<Operation>, SpecError> {
        let Some(item) = self.path_item(template.original()) else {
            return Ok(None);
        };
        let Some(op) = item
            .iter()
            .find(|(k, _)| {
                k.eq_ignore_ascii_case(method)
                    && HTTP_METHODS.contains(&k.to_ascii_lowercase().as_str())
            })
            .map(|(_, v)| v)
        else {
            return Ok(None);
        };

        let mut parameters = Vec::new();
        let mut request_body = None;
        let declared = item
            .get("parameters")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .chain(
                op.get("parameters")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten(),
            );

        for raw in declared {
            let raw = self.resolve(raw)?;
            let location = raw.get("in").and_then(Value::as_str).unwrap_or_default();
            if location.eq_ignore_ascii_case("body") {
                request_body = Some(RequestBodySpec {
                    required: raw.get("required").and_then(Value::as_bool).unwrap_or(false),
                    schema: raw.get("schema").cloned(),
                });
                continue;
            }
            let Some(parameter) = self.parameter(raw)? else {
                continue;
            };
            // Operation-level declarations override path-level ones.
            parameters.retain(|p: &ParameterSpec| {
                !(p.location == parameter.location && p.name == parameter.name)
            });
            parameters.push(parameter);
        }

        if let Some(body) = op.get("requestBody") {
            request_body = Some(self.request_body(body)?);
        }

        debug!(
            template = template.original(),
            method,
            parameters = parameters.len(),
            has_body = request_body.is_some(),
            "operation resolved"
        );

        Ok(Some(Operation {
            path: template.clone(),
            method: method.to_ascii_uppercase(),
            parameters,
            request_body,
        }))
    }

    fn paths(&self) -> Option<&Map<String, Value>> {
        self.document.get("paths").and_then(Value::as_object)
    }

    fn path_item(&self, template: &str) -> Option<&Map<String, Value>> {
        self.paths()?.get(template).and_then(Value::as_object)
    }

    /// Follow a local `$ref`, if present, until a concrete object is found.
    fn resolve<'a>(&'a self, mut value: &'a Value) -> Result<&'a Value, SpecError> {
        for _ in 0..32 {
            match value.get("$ref").and_then(Value::as_str) {
                Some(reference) => value = navigate_fragment(&self.document, reference)?,
                None => return Ok(value),
            }
        }
        Err(SpecError::UnresolvedRef {
            reference: value.get("$ref").and_then(Value::as_str).unwrap_or_default().to_string(),
        })
    }

    fn parameter(&self, raw: &Value) -> Result<Option<ParameterSpec>, SpecError> {
        let Some(location) = raw
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse)
        else {
            return Ok(None);
        };
        let Some(name) = raw.get("name").and_then(Value::as_str) else {
            return Ok(None);
        };
        let required = raw
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(location == ParameterLocation::Path);

        let schema = match self.version {
            SpecVersion::Swagger2 => {
                let mut schema = flatten_schema(raw);
                schema.collection_format = raw
                    .get("collectionFormat")
                    .and_then(Value::as_str)
                    .and_then(CollectionFormat::parse)
                    .unwrap_or_default();
                schema
            }
            SpecVersion::OpenApi30 | SpecVersion::OpenApi31 => {
                let declared = match raw.get("schema") {
                    Some(s) => self.resolve(s)?,
                    None => &NO_SCHEMA,
                };
                let mut schema = flatten_schema(declared);
                schema.collection_format = style_to_format(raw, location);
                schema
            }
        };

        Ok(Some(ParameterSpec {
            name: name.to_string(),
            location,
            required,
            schema,
        }))
    }

    fn request_body(&self, raw: &Value) -> Result<RequestBodySpec, SpecError> {
        let body = self.resolve(raw)?;
        let content = body.get("content").and_then(Value::as_object);
        let media = content.and_then(|c| {
            c.get("application/json").or_else(|| {
                c.iter()
                    .find(|(media_type, _)| is_json_media_type(media_type))
                    .map(|(_, v)| v)
            })
        });
        Ok(RequestBodySpec {
            required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema: media.and_then(|m| m.get("schema")).cloned(),
        })
    }
}

/// Whether a media type carries JSON (`application/json`, `*/*+json`).
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn derive_base_path(document: &Value, version: SpecVersion) -> Option<String> {
    let raw = match version {
        SpecVersion::Swagger2 => document
            .get("basePath")
            .and_then(Value::as_str)?
            .to_string(),
        SpecVersion::OpenApi30 | SpecVersion::OpenApi31 => {
            let server = document.get("servers")?.get(0)?.get("url")?.as_str()?;
            match url::Url::parse(server) {
                Ok(url) => url.path().to_string(),
                Err(_) => server.to_string(),
            }
        }
    };
    clean_base_path(&raw)
}

fn clean_base_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn flatten_schema(source: &Value) -> ParameterSchema {
    let string = |key: &str| source.get(key).and_then(Value::as_str).map(str::to_string);
    let count = |key: &str| source.get(key).and_then(Value::as_u64);
    let (minimum, exclusive_minimum) = bound(source, "minimum", "exclusiveMinimum");
    let (maximum, exclusive_maximum) = bound(source, "maximum", "exclusiveMaximum");

    ParameterSchema {
        type_name: string("type"),
        format: string("format"),
        enumeration: source
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(enum_value_string).collect())
            .unwrap_or_default(),
        pattern: string("pattern"),
        min_length: count("minLength"),
        max_length: count("maxLength"),
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
        min_items: count("minItems"),
        max_items: count("maxItems"),
        unique_items: source
            .get("uniqueItems")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        collection_format: CollectionFormat::default(),
        items: source.get("items").cloned(),
    }
}

/// A numeric bound and whether it is exclusive.
///
/// Draft 4 documents flag exclusivity with a boolean next to the bound;
/// OpenAPI 3.1 puts the exclusive bound itself under the `exclusive*` key.
fn bound(source: &Value, inclusive: &str, exclusive: &str) -> (Option<f64>, bool) {
    let inclusive = source.get(inclusive).and_then(Value::as_f64);
    match source.get(exclusive) {
        Some(Value::Bool(flag)) => (inclusive, *flag && inclusive.is_some()),
        Some(value) => match value.as_f64() {
            Some(n) => (Some(n), true),
            None => (inclusive, false),
        },
        None => (inclusive, false),
    }
}

fn enum_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn style_to_format(raw: &Value, location: ParameterLocation) -> CollectionFormat {
    let style = raw.get("style").and_then(Value::as_str);
    let style = style.unwrap_or(match location {
        ParameterLocation::Query => "form",
        ParameterLocation::Path | ParameterLocation::Header => "simple",
    });
    let explode = raw
        .get("explode")
        .and_then(Value::as_bool)
        .unwrap_or(style == "form");

    match style {
        "form" if explode => CollectionFormat::Multi,
        "spaceDelimited" => CollectionFormat::Ssv,
        "pipeDelimited" => CollectionFormat::Pipes,
        _ => CollectionFormat::Csv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn openapi() -> ApiSpec {
        ApiSpec::from_value(json!({
            "openapi": "3.0.1",
            "servers": [ { "url": "https://api.example.com/v1/" } ],
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": { "type": "integer", "format": "int32", "maximum": 100 }
                            },
                            {
                                "name": "tags",
                                "in": "query",
                                "explode": false,
                                "schema": { "type": "array", "items": { "type": "string" } }
                            },
                            {
                                "name": "name",
                                "in": "query",
                                "schema": { "type": "string", "minLength": 2, "maxLength": 3 }
                            },
                            { "$ref": "#/components/parameters/TraceId" }
                        ]
                    },
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pet" }
                                }
                            }
                        }
                    }
                },
                "/pets/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "schema": { "type": "string" } }
                    ],
                    "get": {
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ]
                    },
                    "delete": {}
                }
            },
            "components": {
                "parameters": {
                    "TraceId": {
                        "name": "X-Trace-Id",
                        "in": "header",
                        "required": true,
                        "schema": { "type": "string", "pattern": "^[a-f0-9]+$" }
                    }
                },
                "schemas": { "Pet": { "type": "object" } }
            }
        }))
        .unwrap()
    }

    fn swagger() -> ApiSpec {
        ApiSpec::from_value(json!({
            "swagger": "2.0",
            "basePath": "/api",
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [
                            {
                                "name": "ids",
                                "in": "query",
                                "type": "array",
                                "collectionFormat": "pipes",
                                "items": { "type": "integer" },
                                "uniqueItems": true
                            },
                            {
                                "name": "kind",
                                "in": "query",
                                "type": "string",
                                "enum": ["cat", "dog"],
                                "required": true
                            },
                            {
                                "name": "age",
                                "in": "query",
                                "type": "integer",
                                "minimum": 0,
                                "exclusiveMinimum": true
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
                }
            },
            "definitions": { "Pet": { "type": "object" } }
        }))
        .unwrap()
    }

    #[test]
    fn detects_versions() {
        assert_eq!(openapi().version(), SpecVersion::OpenApi30);
        assert_eq!(swagger().version(), SpecVersion::Swagger2);
        let v31 = ApiSpec::from_value(json!({ "openapi": "3.1.0", "paths": {} })).unwrap();
        assert_eq!(v31.version(), SpecVersion::OpenApi31);
        assert_eq!(v31.version().draft(), Draft::Draft202012);
    }

    #[test]
    fn rejects_unknown_version() {
        let result = ApiSpec::from_value(json!({ "paths": {} }));
        assert!(matches!(result, Err(SpecError::UnsupportedVersion)));
        let result = ApiSpec::from_value(json!({ "swagger": "1.2" }));
        assert!(matches!(result, Err(SpecError::UnsupportedVersion)));
    }

    #[test]
    fn yaml_numeric_version_is_accepted() {
        let spec = ApiSpec::from_value(json!({ "openapi": 3.0, "paths": {} })).unwrap();
        assert_eq!(spec.version(), SpecVersion::OpenApi30);
    }

    #[test]
    fn base_paths() {
        assert_eq!(openapi().base_path(), Some("/v1"));
        assert_eq!(swagger().base_path(), Some("/api"));
        let relative =
            ApiSpec::from_value(json!({ "openapi": "3.0.0", "servers": [ { "url": "/" } ] }))
                .unwrap();
        assert_eq!(relative.base_path(), None);
        let overridden = swagger().with_base_path(Some("v3/".into()));
        assert_eq!(overridden.base_path(), Some("/v3"));
    }

    #[test]
    fn templates_and_methods_in_document_order() {
        let spec = openapi();
        let templates: Vec<&str> = spec.path_templates().collect();
        assert_eq!(templates, ["/pets", "/pets/{id}"]);
        assert_eq!(spec.methods("/pets"), ["GET", "POST"]);
        assert_eq!(spec.methods("/pets/{id}"), ["GET", "DELETE"]);
        assert!(spec.methods("/owners").is_empty());
    }

    #[test]
    fn openapi_parameters_flattened() {
        let spec = openapi();
        let op = spec.operation(&NormalizedPath::new("/pets"), "get").unwrap().unwrap();
        assert_eq!(op.method, "GET");
        assert_eq!(op.parameters.len(), 4);

        let limit = &op.parameters[0];
        assert_eq!(limit.location, ParameterLocation::Query);
        assert!(!limit.required);
        assert_eq!(limit.schema.format.as_deref(), Some("int32"));
        assert_eq!(limit.schema.maximum, Some(100.0));
        assert_eq!(limit.schema.collection_format, CollectionFormat::Multi);

        let tags = &op.parameters[1];
        assert_eq!(tags.schema.collection_format, CollectionFormat::Csv);
        assert_eq!(tags.schema.items, Some(json!({ "type": "string" })));

        let name = &op.parameters[2];
        assert_eq!(name.schema.min_length, Some(2));
        assert_eq!(name.schema.max_length, Some(3));

        let trace = &op.parameters[3];
        assert_eq!(trace.name, "X-Trace-Id");
        assert_eq!(trace.location, ParameterLocation::Header);
        assert!(trace.required);
        assert_eq!(trace.schema.pattern.as_deref(), Some("^[a-f0-9]+$"));
        assert!(op.request_body.is_none());
    }

    #[test]
    fn operation_parameters_override_path_level() {
        let spec = openapi();
        let op = spec.operation(&NormalizedPath::new("/pets/{id}"), "GET").unwrap().unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].schema.type_name.as_deref(), Some("integer"));

        let op = spec.operation(&NormalizedPath::new("/pets/{id}"), "DELETE").unwrap().unwrap();
        assert_eq!(op.parameters[0].schema.type_name.as_deref(), Some("string"));
        assert!(op.parameters[0].required);
    }

    #[test]
    fn openapi_request_body() {
        let spec = openapi();
        let op = spec.operation(&NormalizedPath::new("/pets"), "post").unwrap().unwrap();
        let body = op.request_body.unwrap();
        assert!(body.required);
        assert_eq!(body.schema, Some(json!({ "$ref": "#/components/schemas/Pet" })));
    }

    #[test]
    fn swagger_parameters_and_body() {
        let spec = swagger();
        let op = spec.operation(&NormalizedPath::new("/pets"), "get").unwrap().unwrap();
        let ids = &op.parameters[0];
        assert_eq!(ids.schema.collection_format, CollectionFormat::Pipes);
        assert!(ids.schema.unique_items);
        let kind = &op.parameters[1];
        assert_eq!(kind.schema.enumeration, ["cat", "dog"]);
        assert!(kind.required);
        let age = &op.parameters[2];
        assert_eq!(age.schema.minimum, Some(0.0));
        assert!(age.schema.exclusive_minimum);
        assert!(!age.schema.exclusive_maximum);

        let op = spec.operation(&NormalizedPath::new("/pets"), "post").unwrap().unwrap();
        assert!(op.parameters.is_empty());
        assert!(op.request_body.unwrap().required);
    }

    #[test]
    fn numeric_exclusive_bounds_from_openapi_31() {
        let spec = ApiSpec::from_value(json!({
            "openapi": "3.1.0",
            "paths": {
                "/a": {
                    "get": {
                        "parameters": [
                            {
                                "name": "ratio",
                                "in": "query",
                                "schema": { "type": "number", "exclusiveMaximum": 1 }
                            }
                        ]
                    }
                }
            }
        }))
        .unwrap();
        let op = spec.operation(&NormalizedPath::new("/a"), "GET").unwrap().unwrap();
        let ratio = &op.parameters[0].schema;
        assert_eq!(ratio.maximum, Some(1.0));
        assert!(ratio.exclusive_maximum);
        assert_eq!(ratio.minimum, None);
    }

    #[test]
    fn missing_method_is_none() {
        let spec = swagger();
        assert!(spec.operation(&NormalizedPath::new("/pets"), "HEAD").unwrap().is_none());
    }

    #[test]
    fn unresolved_parameter_ref_is_error() {
        let spec = ApiSpec::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": { "get": { "parameters": [ { "$ref": "#/components/parameters/Nope" } ] } }
            }
        }))
        .unwrap();
        let result = spec.operation(&NormalizedPath::new("/a"), "GET");
        assert!(matches!(result, Err(SpecError::UnresolvedRef { .. })));
    }

    #[test]
    fn shared_schemas_field_per_version() {
        assert_eq!(openapi().shared_schemas().unwrap().0, "components");
        assert_eq!(swagger().shared_schemas().unwrap().0, "definitions");
    }

    #[test]
    fn json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/merge-patch+json"));
        assert!(!is_json_media_type("text/plain"));
    }
}
