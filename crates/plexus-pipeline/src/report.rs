//! Partial handler reports and the per-request accumulator they merge into.

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use serde::Serialize;
use serde_json::Value;

use plexus_core::AppResult;

use crate::outcome::{Outcome, ResponseBody};

/// The partial result one handler returns for one request.
#[derive(Debug, Clone, Default)]
pub struct HandlerReport {
    /// Whether this handler claims the request. Ends the chain.
    pub complete: bool,
    /// Status to respond with. Defaults to 200 on completion.
    pub status: Option<StatusCode>,
    /// Headers added to the response.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Option<Bytes>,
    /// File to stream as the response body.
    pub file_path: Option<PathBuf>,
    /// Values published to later handlers of the same request.
    pub shared_additions: HashMap<String, Value>,
}

impl HandlerReport {
    /// A report that lets the request continue down the chain.
    pub fn pass() -> Self {
        Self::default()
    }

    /// A report that claims the request.
    pub fn complete() -> Self {
        Self {
            complete: true,
            ..Self::default()
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the response status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the body and sets `content-type: application/json`.
    pub fn with_json<T: Serialize>(self, value: &T) -> AppResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body))
    }

    /// Streams the file at `path` as the body.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Publishes a value to later handlers.
    pub fn share(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.shared_additions.insert(key.into(), value.into());
        self
    }
}

/// Accumulated result of the handlers run so far for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainResult {
    /// Set by the first completing handler and never cleared.
    pub complete: bool,
    /// Last status supplied.
    pub status: Option<StatusCode>,
    /// Union of all supplied headers.
    pub headers: HeaderMap,
    /// Last body supplied.
    pub body: Option<Bytes>,
    /// Last file supplied.
    pub file_path: Option<PathBuf>,
}

impl ChainResult {
    /// Merges a handler report.
    ///
    /// Headers are unioned with the later report winning on a name
    /// collision; multiple values for one name inside a single report are
    /// kept. Status, body and file are replaced when the report supplies
    /// them. Shared additions are not part of the result and are ignored.
    pub fn merge(&mut self, report: HandlerReport) {
        let mut current: Option<HeaderName> = None;
        for (name, value) in report.headers {
            match name {
                Some(name) => {
                    self.headers.insert(name.clone(), value);
                    current = Some(name);
                }
                None => {
                    if let Some(name) = &current {
                        self.headers.append(name.clone(), value);
                    }
                }
            }
        }
        if report.status.is_some() {
            self.status = report.status;
        }
        if report.body.is_some() {
            self.body = report.body;
        }
        if report.file_path.is_some() {
            self.file_path = report.file_path;
        }
        self.complete |= report.complete;
    }

    /// Converts a completed result into a success outcome.
    ///
    /// A file takes precedence over an in-memory body.
    pub fn into_outcome(self) -> Outcome {
        let body = match (self.file_path, self.body) {
            (Some(path), _) => ResponseBody::File(path),
            (None, Some(bytes)) => ResponseBody::Bytes(bytes),
            (None, None) => ResponseBody::Empty,
        };
        Outcome::Success {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body,
        }
    }
}
