//! Transport-facing exchange types
//!
//! The hosting proxy hands Scribe already-parsed request and response data.
//! These types are the neutral view of that data, so no transport crate leaks
//! into the rest of the workspace.

use std::collections::HashMap;
use std::fmt;

/// Opaque identifier for one in-flight request/response exchange.
///
/// Supplied by the hosting transport. Scribe only compares and hashes it; the
/// same identifier must be presented for both halves of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExchangeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Case-insensitive header map.
///
/// Header names are folded to ASCII lowercase on insert and lookup.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    values: HashMap<String, String>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a header value by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// True when no headers are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// The request half of an exchange, as parsed by the hosting transport.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request path, query string included.
    pub path: String,
    /// Decoded UTF-8 body text; empty when the request had no body.
    pub body: String,
    /// Request headers.
    pub headers: Headers,
}

impl RequestHead {
    /// Create a request head with no body and no headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: String::new(),
            headers: Headers::new(),
        }
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// The response half of an exchange.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    /// Decoded UTF-8 body text; empty when the response had no body.
    pub body: String,
    /// Response headers.
    pub headers: Headers,
}

impl ResponseHead {
    /// Create a response head from body text, with no headers.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            headers: Headers::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The `content-type` header, or the empty string when absent.
    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }
}
