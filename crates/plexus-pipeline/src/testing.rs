//! In-memory [`RequestStream`] for tests and embedding.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use plexus_core::{AppError, AppResult};

use crate::stream::RequestStream;

/// What a [`MemoryStream`] was asked to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// In-memory body; empty for file responses.
    pub body: Bytes,
    /// File requested with `respond_with_file`.
    pub file: Option<PathBuf>,
}

impl WrittenResponse {
    /// The body decoded lossily as UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A request held entirely in memory that records the response written.
#[derive(Debug)]
pub struct MemoryStream {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    chunks: VecDeque<AppResult<Bytes>>,
    reject_writes: bool,
    response: Option<WrittenResponse>,
    failure: Option<AppError>,
}

impl MemoryStream {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            chunks: VecDeque::new(),
            reject_writes: false,
            response: None,
            failure: None,
        }
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends a body chunk.
    pub fn with_chunk(mut self, chunk: impl Into<Bytes>) -> Self {
        self.chunks.push_back(Ok(chunk.into()));
        self
    }

    /// Appends a body read failure.
    pub fn with_broken_body(mut self, error: AppError) -> Self {
        self.chunks.push_back(Err(error));
        self
    }

    /// Makes every write fail with a transport error.
    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    /// The response written, if any.
    pub fn response(&self) -> Option<&WrittenResponse> {
        self.response.as_ref()
    }

    /// The failure signalled, if any.
    pub fn failure(&self) -> Option<&AppError> {
        self.failure.as_ref()
    }

    fn record(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        file: Option<PathBuf>,
    ) -> AppResult<()> {
        if self.reject_writes {
            return Err(AppError::transport("stream is closed"));
        }
        if self.response.is_some() {
            return Err(AppError::transport("response already written"));
        }
        self.response = Some(WrittenResponse {
            status,
            headers,
            body,
            file,
        });
        Ok(())
    }
}

#[async_trait]
impl RequestStream for MemoryStream {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    async fn next_chunk(&mut self) -> Option<AppResult<Bytes>> {
        self.chunks.pop_front()
    }

    async fn respond(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> AppResult<()> {
        self.record(status, headers, body, None)
    }

    async fn respond_with_file(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        path: &Path,
    ) -> AppResult<()> {
        self.record(status, headers, Bytes::new(), Some(path.to_path_buf()))
    }

    async fn fail(&mut self, error: &AppError) {
        self.failure = Some(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_split() {
        let stream = MemoryStream::new(Method::GET, "/search?q=rust");
        assert_eq!(stream.path(), "/search");
        assert_eq!(stream.query(), Some("q=rust"));
    }

    #[tokio::test]
    async fn test_second_write_is_rejected() {
        let mut stream = MemoryStream::new(Method::GET, "/");
        stream
            .respond(StatusCode::OK, HeaderMap::new(), Bytes::new())
            .await
            .unwrap();
        assert!(
            stream
                .respond(StatusCode::OK, HeaderMap::new(), Bytes::new())
                .await
                .is_err()
        );
    }
}
