//! Violation records and the stable error-code catalog.

use serde::Serialize;

/// Stable, wire-visible violation codes.
///
/// Each code maps to a human-readable template taking two `%s`
/// placeholders: the kind of field (e.g. "query parameter") and its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotNull,
    Type,
    Pattern,
    Enum,
    MaxLength,
    MinLength,
    MaxItems,
    MinItems,
    MinValue,
    MaxValue,
    Duplicates,
    UnexpectedBody,
    MissingBody,
    Default,
}

const CATALOG: &[ErrorCode] = &[
    ErrorCode::NotNull,
    ErrorCode::Type,
    ErrorCode::Pattern,
    ErrorCode::Enum,
    ErrorCode::MaxLength,
    ErrorCode::MinLength,
    ErrorCode::MaxItems,
    ErrorCode::MinItems,
    ErrorCode::MinValue,
    ErrorCode::MaxValue,
    ErrorCode::Duplicates,
    ErrorCode::UnexpectedBody,
    ErrorCode::MissingBody,
    ErrorCode::Default,
];

impl ErrorCode {
    /// Numeric code as it appears on the wire.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCode::NotNull => "1028",
            ErrorCode::Type => "1029",
            ErrorCode::Pattern => "1023",
            ErrorCode::Enum => "1008",
            ErrorCode::MaxLength => "1013",
            ErrorCode::MinLength => "1017",
            ErrorCode::MaxItems => "1012",
            ErrorCode::MinItems => "1016",
            ErrorCode::MinValue => "1015",
            ErrorCode::MaxValue => "1011",
            ErrorCode::Duplicates => "1031",
            ErrorCode::UnexpectedBody => "9001",
            ErrorCode::MissingBody => "9002",
            ErrorCode::Default => "9999",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ErrorCode::NotNull => "The %s %s is mandatory",
            ErrorCode::Type => "The %s %s does not have the correct type",
            ErrorCode::Pattern => "The %s %s does not have the correct pattern",
            ErrorCode::Enum => "The %s %s does not have the correct enum value",
            ErrorCode::MaxLength | ErrorCode::MinLength => "The %s %s has an incorrect size",
            ErrorCode::MaxItems => "The %s %s has too many items",
            ErrorCode::MinItems => "The %s %s has too few items",
            ErrorCode::MinValue => "The %s %s is below minimum allowed value",
            ErrorCode::MaxValue => "The %s %s is above maximum allowed value",
            ErrorCode::Duplicates => "The %s %s does not allow duplicate values",
            ErrorCode::UnexpectedBody => "No request body is expected but one was found",
            ErrorCode::MissingBody => "Request body is expected but not found",
            ErrorCode::Default => "The payload could not be parsed",
        }
    }

    /// Look up a catalog entry by its numeric code.
    pub fn from_code(code: &str) -> Option<Self> {
        CATALOG.iter().copied().find(|c| c.code() == code)
    }
}

/// Template for a numeric code, falling back to the DEFAULT message.
pub fn message_for_code(code: &str) -> &'static str {
    ErrorCode::from_code(code)
        .unwrap_or(ErrorCode::Default)
        .template()
}

/// Substitute the field kind and field name into a catalog template.
///
/// Templates without placeholders are returned unchanged.
pub fn render(template: &str, kind: &str, field: &str) -> String {
    let mut out = String::with_capacity(template.len() + kind.len() + field.len());
    let mut args = [kind, field].into_iter();
    let mut rest = template;
    while let Some(idx) = rest.find("%s") {
        out.push_str(&rest[..idx]);
        out.push_str(args.next().unwrap_or(""));
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

/// A single reported non-conformance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    pub code: String,
    /// Field path token; JSON-schema violations use `$.a.b` paths,
    /// locally synthesized ones the parameter name.
    pub path: String,
    pub arguments: Vec<String>,
}

impl ValidationMessage {
    pub fn new(code: ErrorCode, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: code.code().to_string(),
            arguments: vec![name.clone()],
            path: name,
        }
    }

    /// The field identifier: the path token up to its first colon.
    pub fn field(&self) -> &str {
        self.path.split(':').next().unwrap_or_default()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(&self.code)
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:validation failed [{}]", self.path, self.code)
    }
}
