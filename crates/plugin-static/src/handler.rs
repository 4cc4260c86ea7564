//! Request handler that resolves paths under the static root.

use std::path::PathBuf;

use async_trait::async_trait;
use plexus_core::AppResult;
use plexus_core::config::plugin::StaticFilesConfig;
use plexus_pipeline::http::{HeaderValue, Method, header};
use plexus_pipeline::shared::keys;
use plexus_pipeline::{Handler, HandlerReport, RequestContext};
use tracing::debug;

/// Completes `GET`/`HEAD` requests for files under the root.
#[derive(Debug, Clone)]
pub struct StaticHandler {
    root: PathBuf,
    url_prefix: String,
    index_file: String,
}

impl StaticHandler {
    /// Creates a handler from configuration.
    pub fn new(config: &StaticFilesConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
            index_file: config.index_file.clone(),
        }
    }

    /// The part of `path` below the URL prefix, or `None` outside it.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.url_prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Maps a request path to an existing file under the root.
    ///
    /// Paths with `..` segments are never resolved. A directory resolves to
    /// its index file.
    pub async fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = self.relative(path)?;

        let mut resolved = self.root.clone();
        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    debug!(path = %path, "Rejected path traversal");
                    return None;
                }
                s if s.contains('\\') => return None,
                s => resolved.push(s),
            }
        }

        let metadata = tokio::fs::metadata(&resolved).await.ok()?;
        if metadata.is_dir() {
            resolved.push(&self.index_file);
            let metadata = tokio::fs::metadata(&resolved).await.ok()?;
            if !metadata.is_file() {
                return None;
            }
        } else if !metadata.is_file() {
            return None;
        }
        Some(resolved)
    }
}

#[async_trait]
impl Handler for StaticHandler {
    fn name(&self) -> &str {
        "static-files"
    }

    async fn handle(&self, ctx: &RequestContext) -> AppResult<HandlerReport> {
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            return Ok(HandlerReport::pass());
        }
        if self.relative(&ctx.path).is_none() {
            return Ok(HandlerReport::pass());
        }

        let Some(file) = self.resolve(&ctx.path).await else {
            return Ok(HandlerReport::pass()
                .share(keys::STATIC_FILE_ROOT, self.root.display().to_string()));
        };

        let mime = mime_guess::from_path(&file).first_or_octet_stream();
        let mut report = HandlerReport::complete();
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            report = report.with_header(header::CONTENT_TYPE, value);
        }
        debug!(path = %ctx.path, file = %file.display(), "Serving static file");
        Ok(report.with_file(file))
    }
}
