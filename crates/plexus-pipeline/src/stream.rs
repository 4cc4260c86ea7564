//! The transport seam: a single inbound request and its response writer.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use plexus_core::{AppError, AppResult};

/// One inbound request as handed over by a network transport.
///
/// The pipeline reads the head fields, drains the body with
/// [`next_chunk`](Self::next_chunk), then writes exactly one response with
/// `respond`, `respond_with_file`, or `fail`.
#[async_trait]
pub trait RequestStream: Send {
    /// Request method.
    fn method(&self) -> &Method;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// Raw query string.
    fn query(&self) -> Option<&str>;

    /// Request headers.
    fn headers(&self) -> &HeaderMap;

    /// Next body chunk, `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Option<AppResult<Bytes>>;

    /// Writes status, headers and an in-memory body.
    async fn respond(&mut self, status: StatusCode, headers: HeaderMap, body: Bytes)
    -> AppResult<()>;

    /// Writes status and headers, then streams the file at `path`.
    async fn respond_with_file(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        path: &Path,
    ) -> AppResult<()>;

    /// Signals a hard failure after a response could not be written.
    async fn fail(&mut self, error: &AppError);
}
