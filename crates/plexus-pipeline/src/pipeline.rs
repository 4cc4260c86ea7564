//! The frozen handler chain and per-request dispatch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures::FutureExt;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use tracing::{debug, error, info};

use plexus_core::config::pipeline::PipelineConfig;
use plexus_core::types::{ErrorBody, ErrorDetail};
use plexus_core::{AppError, AppResult, ErrorKind};

use crate::context::RequestContext;
use crate::handler::{Handler, HandlerFactory};
use crate::outcome::{Outcome, ResponseBody};
use crate::report::ChainResult;
use crate::stream::RequestStream;

/// Body of the `NOT_FOUND` response.
pub const NOT_FOUND_MESSAGE: &str = "Appropriate handler is not found for this request.";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Pipeline behavior fixed at build time.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Methods accepted; anything else is answered with 405.
    pub allowed_methods: Vec<Method>,
    /// Include the error cause chain in internal error bodies.
    pub expose_trace: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            allowed_methods: vec![Method::HEAD, Method::GET, Method::POST],
            expose_trace: false,
        }
    }
}

impl PipelineOptions {
    /// Builds options from configuration.
    pub fn from_config(config: &PipelineConfig, dev_mode: bool) -> AppResult<Self> {
        let allowed_methods = config
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.as_bytes()).map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Configuration,
                        format!("Invalid allowed method '{m}'"),
                        e,
                    )
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            allowed_methods,
            expose_trace: dev_mode,
        })
    }
}

/// The ordered handler chain, frozen once built.
///
/// Cloning is cheap and clones share the same handler instances, which are
/// read-only after build.
#[derive(Clone)]
pub struct Pipeline {
    handlers: Arc<[Arc<dyn Handler>]>,
    options: Arc<PipelineOptions>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("handlers", &self.handler_names())
            .field("options", &self.options)
            .finish()
    }
}

impl Pipeline {
    /// Instantiates one handler per factory, in the given order.
    ///
    /// A factory failure aborts the build with a configuration error.
    pub async fn build(
        factories: Vec<Arc<dyn HandlerFactory>>,
        options: PipelineOptions,
    ) -> AppResult<Self> {
        if options.allowed_methods.is_empty() {
            return Err(AppError::configuration(
                "Pipeline requires at least one allowed method",
            ));
        }

        let mut handlers = Vec::with_capacity(factories.len());
        for factory in &factories {
            let handler = factory.create().await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Handler factory '{}' failed", factory.name()),
                    e,
                )
            })?;
            debug!(factory = %factory.name(), handler = %handler.name(), "Handler created");
            handlers.push(handler);
        }

        info!(handlers = handlers.len(), "Request pipeline built");
        Ok(Self {
            handlers: handlers.into(),
            options: Arc::new(options),
        })
    }

    /// Names of the handlers in chain order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// The options the pipeline was built with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Returns whether requests with `method` reach the chain.
    pub fn allows(&self, method: &Method) -> bool {
        self.options.allowed_methods.contains(method)
    }

    /// Serves one request end to end and writes the response to `stream`.
    pub async fn handle(&self, stream: &mut dyn RequestStream) -> Outcome {
        let started = Instant::now();
        let method = stream.method().clone();
        let path = stream.path().to_string();
        debug!(method = %method, path = %path, "Request received");

        let outcome = if !self.allows(&method) {
            Outcome::NotAllowed {
                allowed: self.options.allowed_methods.clone(),
            }
        } else {
            match read_body(stream).await {
                Ok(body) => {
                    let ctx = RequestContext {
                        method: method.clone(),
                        path: path.clone(),
                        query: stream.query().map(str::to_string),
                        headers: stream.headers().clone(),
                        body,
                        shared: Default::default(),
                    };
                    self.process(ctx).await
                }
                Err(e) => {
                    error!(method = %method, path = %path, error = %e, "Failed to read request body");
                    Outcome::internal(&e, self.options.expose_trace)
                }
            }
        };

        if let Err(e) = self.write(stream, &outcome).await {
            error!(method = %method, path = %path, error = %e, "Failed to write response");
            stream.fail(&e).await;
        }

        debug!(
            method = %method,
            path = %path,
            outcome = %outcome.kind(),
            status = outcome.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request finished"
        );
        outcome
    }

    /// Runs the chain against a prepared context.
    ///
    /// Handlers run strictly in order. Shared additions become visible to
    /// the next handler. The first completing handler ends the chain.
    pub async fn process(&self, mut ctx: RequestContext) -> Outcome {
        let mut result = ChainResult::default();

        for handler in self.handlers.iter() {
            let invocation = AssertUnwindSafe(handler.handle(&ctx)).catch_unwind().await;
            let mut report = match invocation {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => return self.fault(handler.name(), &ctx, e),
                Err(panic) => {
                    let e = AppError::handler(format!(
                        "Handler '{}' panicked: {}",
                        handler.name(),
                        panic_message(panic.as_ref())
                    ));
                    return self.fault(handler.name(), &ctx, e);
                }
            };

            ctx.shared.extend(std::mem::take(&mut report.shared_additions));
            result.merge(report);
            if result.complete {
                debug!(handler = %handler.name(), path = %ctx.path, "Request completed");
                return result.into_outcome();
            }
        }

        Outcome::NotFound
    }

    fn fault(&self, handler: &str, ctx: &RequestContext, e: AppError) -> Outcome {
        error!(
            handler = %handler,
            method = %ctx.method,
            path = %ctx.path,
            trace = ?e.trace(),
            "Handler failed"
        );
        Outcome::internal(&e, self.options.expose_trace)
    }

    async fn write(&self, stream: &mut dyn RequestStream, outcome: &Outcome) -> AppResult<()> {
        match outcome {
            Outcome::NotAllowed { allowed } => {
                let names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                let mut headers = text_headers();
                if let Ok(value) = HeaderValue::from_str(&names.join(", ")) {
                    headers.insert(header::ALLOW, value);
                }
                let body = format!("Only {} methods are allowed.", names.join(", "));
                stream
                    .respond(StatusCode::METHOD_NOT_ALLOWED, headers, Bytes::from(body))
                    .await
            }
            Outcome::NotFound => {
                stream
                    .respond(
                        StatusCode::NOT_FOUND,
                        text_headers(),
                        Bytes::from_static(NOT_FOUND_MESSAGE.as_bytes()),
                    )
                    .await
            }
            Outcome::Internal { message, trace } => {
                let body = ErrorBody {
                    error: ErrorDetail {
                        message: message.clone(),
                        trace: trace.clone(),
                    },
                };
                let json = serde_json::to_vec(&body)?;
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                stream
                    .respond(StatusCode::INTERNAL_SERVER_ERROR, headers, Bytes::from(json))
                    .await
            }
            Outcome::Success {
                status,
                headers,
                body,
            } => match body {
                ResponseBody::File(path) => {
                    stream
                        .respond_with_file(*status, headers.clone(), path)
                        .await
                }
                ResponseBody::Bytes(bytes) => {
                    stream.respond(*status, headers.clone(), bytes.clone()).await
                }
                ResponseBody::Empty => stream.respond(*status, headers.clone(), Bytes::new()).await,
            },
        }
    }
}

async fn read_body(stream: &mut dyn RequestStream) -> AppResult<Bytes> {
    let mut body = BytesMut::new();
    while let Some(chunk) = stream.next_chunk().await {
        body.extend_from_slice(&chunk?);
    }
    Ok(body.freeze())
}

fn text_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    headers
}

/// Renders a caught panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = PipelineConfig {
            allowed_methods: vec!["GET".to_string(), "PUT".to_string()],
        };
        let options = PipelineOptions::from_config(&config, true).unwrap();
        assert_eq!(options.allowed_methods, vec![Method::GET, Method::PUT]);
        assert!(options.expose_trace);
    }

    #[test]
    fn test_options_reject_invalid_method() {
        let config = PipelineConfig {
            allowed_methods: vec!["GE T".to_string()],
        };
        let err = PipelineOptions::from_config(&config, false).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
