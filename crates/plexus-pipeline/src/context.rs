//! Per-request context handed to every handler.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use plexus_core::{AppError, AppResult};

use crate::shared::SharedState;

/// Everything a handler may inspect about the request being served.
///
/// The body is fully materialized before the first handler runs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Complete request body.
    pub body: Bytes,
    /// Values published by earlier handlers.
    pub shared: SharedState,
}

impl RequestContext {
    /// Creates a context with no headers and an empty body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            shared: SharedState::new(),
        }
    }

    /// Sets the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body decoded as UTF-8.
    pub fn body_text(&self) -> AppResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| AppError::validation(format!("Request body is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_text() {
        let ctx = RequestContext::new(Method::POST, "/api").with_body("hello");
        assert_eq!(ctx.body_text().unwrap(), "hello");

        let ctx = RequestContext::new(Method::POST, "/api").with_body(vec![0xff, 0xfe]);
        assert!(ctx.body_text().is_err());
    }

    #[test]
    fn test_header_lookup() {
        let ctx = RequestContext::new(Method::GET, "/")
            .with_header(http::header::ACCEPT, HeaderValue::from_static("text/html"));
        assert_eq!(ctx.header("accept"), Some("text/html"));
        assert_eq!(ctx.header("x-missing"), None);
    }
}
