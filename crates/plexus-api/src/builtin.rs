//! The built-in `core` plugin.
//!
//! Contributes two handlers that sit at the front of every chain:
//! `request-id` tags each request and `health` answers liveness probes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use uuid::Uuid;

use plexus_core::AppResult;
use plexus_pipeline::shared::keys;
use plexus_pipeline::{ClosureFactory, Handler, HandlerReport, RequestContext};
use plexus_plugin::{ClosureAction, CommandDescriptor, PluginDescriptor};

/// Name of the built-in plugin.
pub const CORE_PLUGIN: &str = "core";

/// Header carrying the request identifier.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Path answered by the health handler.
pub const HEALTH_PATH: &str = "/health";

/// Builds the `core` plugin descriptor.
pub fn core_plugin() -> PluginDescriptor {
    PluginDescriptor::new(CORE_PLUGIN)
        .version(env!("CARGO_PKG_VERSION"))
        .description("Request identifiers and health probe")
        .handler(ClosureFactory::shared("request-id", || {
            Ok(Arc::new(RequestIdHandler) as Arc<dyn Handler>)
        }))
        .handler(ClosureFactory::shared("health", || {
            Ok(Arc::new(HealthHandler) as Arc<dyn Handler>)
        }))
        .command(
            CommandDescriptor::new(
                "version",
                ClosureAction::new(|_| async {
                    println!("plexus {}", env!("CARGO_PKG_VERSION"));
                    Ok(())
                }),
            )
            .realm(CORE_PLUGIN)
            .description("Print the server version"),
        )
}

/// Tags every request with an identifier and passes it on.
///
/// A valid incoming `x-request-id` is kept; otherwise a UUID v4 is generated.
#[derive(Debug)]
pub struct RequestIdHandler;

#[async_trait]
impl Handler for RequestIdHandler {
    fn name(&self) -> &str {
        "request-id"
    }

    async fn handle(&self, ctx: &RequestContext) -> AppResult<HandlerReport> {
        let id = ctx
            .header(REQUEST_ID_HEADER.as_str())
            .filter(|v| !v.is_empty() && v.len() <= 128)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut report = HandlerReport::pass().share(keys::REQUEST_ID, id.clone());
        if let Ok(value) = HeaderValue::from_str(&id) {
            report = report.with_header(REQUEST_ID_HEADER, value);
        }
        Ok(report)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Completes `GET /health` and `HEAD /health`.
#[derive(Debug)]
pub struct HealthHandler;

#[async_trait]
impl Handler for HealthHandler {
    fn name(&self) -> &str {
        "health"
    }

    async fn handle(&self, ctx: &RequestContext) -> AppResult<HandlerReport> {
        let probe = ctx.method == Method::GET || ctx.method == Method::HEAD;
        if !probe || ctx.path != HEALTH_PATH {
            return Ok(HandlerReport::pass());
        }
        HandlerReport::complete().with_json(&HealthResponse { status: "ok" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_id_is_generated_and_shared() {
        let report = RequestIdHandler
            .handle(&RequestContext::new(Method::GET, "/"))
            .await
            .unwrap();

        assert!(!report.complete);
        let header = report.headers.get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(header).is_ok());
        assert_eq!(
            report.shared_additions.get(keys::REQUEST_ID).unwrap(),
            &serde_json::Value::from(header)
        );
    }

    #[tokio::test]
    async fn test_request_id_keeps_incoming_value() {
        let ctx = RequestContext::new(Method::GET, "/")
            .with_header(REQUEST_ID_HEADER, HeaderValue::from_static("trace-42"));
        let report = RequestIdHandler.handle(&ctx).await.unwrap();
        assert_eq!(report.headers.get(REQUEST_ID_HEADER).unwrap(), "trace-42");
    }

    #[tokio::test]
    async fn test_health_only_claims_its_path() {
        let report = HealthHandler
            .handle(&RequestContext::new(Method::GET, "/health"))
            .await
            .unwrap();
        assert!(report.complete);
        assert_eq!(report.body.unwrap(), r#"{"status":"ok"}"#);

        let report = HealthHandler
            .handle(&RequestContext::new(Method::POST, "/health"))
            .await
            .unwrap();
        assert!(!report.complete);

        let report = HealthHandler
            .handle(&RequestContext::new(Method::GET, "/healthz"))
            .await
            .unwrap();
        assert!(!report.complete);
    }

    #[test]
    fn test_core_plugin_shape() {
        let plugin = core_plugin();
        assert_eq!(plugin.name, CORE_PLUGIN);
        assert!(plugin.dependencies.is_empty());
        let factories: Vec<&str> = plugin.handler_factories.iter().map(|f| f.name()).collect();
        assert_eq!(factories, vec!["request-id", "health"]);
        assert_eq!(plugin.commands[0].full_name(), "core-version");
    }
}
