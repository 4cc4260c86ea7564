//! Adapter from an Axum request to the pipeline's stream abstraction.

use std::path::Path;

use async_trait::async_trait;
use axum::body::{Body, BodyDataStream};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use plexus_core::{AppError, AppResult, ErrorKind};
use plexus_pipeline::RequestStream;

/// One Axum request, recording the response the pipeline writes.
pub struct AxumStream {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: BodyDataStream,
    response: Option<Response>,
}

impl std::fmt::Debug for AxumStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxumStream")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("responded", &self.response.is_some())
            .finish()
    }
}

impl AxumStream {
    /// Wraps a request.
    pub fn new(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body: body.into_data_stream(),
            response: None,
        }
    }

    /// The recorded response, or a bare 500 if nothing was written.
    pub fn into_response(self) -> Response {
        self.response
            .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }

    fn record(&mut self, status: StatusCode, headers: HeaderMap, body: Body) {
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        self.response = Some(response);
    }
}

#[async_trait]
impl RequestStream for AxumStream {
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
        self.body.next().await.map(|chunk| {
            chunk.map_err(|e| {
                AppError::with_source(ErrorKind::Transport, "Failed to read request body", e)
            })
        })
    }

    async fn respond(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> AppResult<()> {
        self.record(status, headers, Body::from(body));
        Ok(())
    }

    async fn respond_with_file(
        &mut self,
        status: StatusCode,
        mut headers: HeaderMap,
        path: &Path,
    ) -> AppResult<()> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("Failed to open '{}'", path.display()),
                e,
            )
        })?;
        if let Ok(metadata) = file.metadata().await {
            headers
                .entry(header::CONTENT_LENGTH)
                .or_insert_with(|| HeaderValue::from(metadata.len()));
        }
        self.record(status, headers, Body::from_stream(ReaderStream::new(file)));
        Ok(())
    }

    async fn fail(&mut self, error: &AppError) {
        tracing::warn!(path = %self.path, error = %error, "Request stream failed");
        self.response = Some(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }
}
