//! The incoming request as seen by the validator.

use std::io;

use url::form_urlencoded;

/// What the validator needs from an HTTP request.
///
/// Implement this over your framework's request type. The body is read
/// once per validation; buffering it so the handler can read it again is
/// the caller's concern.
pub trait IncomingRequest {
    fn method(&self) -> &str;

    /// Request path without query string.
    fn path(&self) -> &str;

    /// All values bound to a query parameter, decoded, in request order.
    ///
    /// Values are checked as returned here and are not decoded again.
    fn query_values(&self, name: &str) -> Vec<String>;

    /// All values of a header, matched case-insensitively.
    fn header_values(&self, name: &str) -> Vec<String>;

    fn content_type(&self) -> Option<String> {
        self.header_values("content-type").into_iter().next()
    }

    /// Raw body bytes; empty when no body was sent.
    fn read_body(&self) -> io::Result<Vec<u8>>;
}

/// An owned request, built from its parts.
///
/// ```
/// use openapi_request_validator::{IncomingRequest, Request};
///
/// let request = Request::builder("GET", "/pets?tag=cat&tag=dog")
///     .header("Accept", "application/json")
///     .build();
///
/// assert_eq!(request.path(), "/pets");
/// assert_eq!(request.query_values("tag"), ["cat", "dog"]);
/// assert_eq!(request.header_values("accept"), ["application/json"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    /// Start a request; `uri` may carry a query string.
    pub fn builder(method: impl Into<String>, uri: &str) -> RequestBuilder {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        RequestBuilder {
            request: Request {
                method: method.into(),
                path: path.to_string(),
                query: parse_query(query),
                headers: Vec::new(),
                body: Vec::new(),
            },
        }
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Parse `Name: value` lines. Lines without a colon are ignored.
    pub fn raw_header(self, line: &str) -> Self {
        match line.split_once(':') {
            Some((name, value)) => self.header(name.trim(), value.trim()),
            None => self,
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Set a JSON body and its content type.
    pub fn json(self, body: &serde_json::Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(body.to_string())
    }

    pub fn build(self) -> Request {
        self.request
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

impl IncomingRequest for Request {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query_values(&self, name: &str) -> Vec<String> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn read_body(&self) -> io::Result<Vec<u8>> {
        Ok(self.body.clone())
    }
}
