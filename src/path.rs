//! Path normalisation and template matching.
//!
//! Request paths and path templates are reduced to the same shape
//! (base path stripped, leading slash, split on `/`) so they can be
//! compared segment by segment.

use tracing::debug;

use crate::spec::ApiSpec;

/// A request path or path template split into segments.
///
/// `parts()[0]` is always the empty segment before the leading slash.
/// Trailing empty segments are dropped, so `/pets/` and `/pets` have the
/// same parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    original: String,
    normalised: String,
    parts: Vec<String>,
}

impl NormalizedPath {
    pub fn new(path: &str) -> Self {
        Self::with_base_path(path, None)
    }

    /// Normalise `path`, removing `base_path` when it prefixes the path.
    pub fn with_base_path(path: &str, base_path: Option<&str>) -> Self {
        let normalised = normalise(path, base_path);
        let mut parts: Vec<String> = normalised.split('/').map(str::to_string).collect();
        while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        Self {
            original: path.to_string(),
            normalised,
            parts,
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Segment at `index`, or `None` when out of range.
    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts.get(index).map(String::as_str)
    }

    /// Whether the segment at `index` is a template parameter (`{name}`).
    pub fn is_param(&self, index: usize) -> bool {
        self.part(index)
            .is_some_and(|p| p.len() >= 2 && p.starts_with('{') && p.ends_with('}'))
    }

    /// Name inside the braces of a parameter segment.
    pub fn param_name(&self, index: usize) -> Option<&str> {
        if !self.is_param(index) {
            return None;
        }
        self.part(index).map(|p| &p[1..p.len() - 1])
    }

    /// The path as originally supplied.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalised(&self) -> &str {
        &self.normalised
    }

    /// Structural match of a request path against a template: equal
    /// segment counts, and every segment either equal ignoring ASCII
    /// case or a template parameter.
    pub fn matches_template(&self, template: &NormalizedPath) -> bool {
        if self.parts.len() != template.parts.len() {
            return false;
        }
        self.parts
            .iter()
            .zip(&template.parts)
            .enumerate()
            .all(|(i, (part, tpl))| part.eq_ignore_ascii_case(tpl) || template.is_param(i))
    }
}

fn normalise(path: &str, base_path: Option<&str>) -> String {
    let stripped = match base_path {
        Some(base) if !base.is_empty() => path.strip_prefix(base).unwrap_or(path),
        _ => path,
    };
    if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

/// Find the first path template in `spec` matching `request_path`.
///
/// Templates are tried in document order; the first structural match
/// wins. `None` means the path is unknown to the document.
pub fn find_matching_path(spec: &ApiSpec, request_path: &NormalizedPath) -> Option<NormalizedPath> {
    let found = spec
        .path_templates()
        .map(NormalizedPath::new)
        .find(|template| request_path.matches_template(template));
    if found.is_none() {
        debug!(path = request_path.original(), "path not defined in API document");
    }
    found
}
