//! Handler and handler factory capabilities.

use std::sync::Arc;

use async_trait::async_trait;

use plexus_core::AppResult;

use crate::context::RequestContext;
use crate::report::HandlerReport;

/// A unit of request processing invoked in fixed chain order.
///
/// A handler that returns `Err` (or panics) aborts the chain and the
/// request is answered with an internal error.
#[async_trait]
pub trait Handler: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Inspects the request and reports what it contributes.
    async fn handle(&self, ctx: &RequestContext) -> AppResult<HandlerReport>;
}

/// Produces a handler instance when the pipeline is built.
#[async_trait]
pub trait HandlerFactory: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Creates a new handler.
    async fn create(&self) -> AppResult<Arc<dyn Handler>>;
}

type HandleFn = dyn Fn(&RequestContext) -> AppResult<HandlerReport> + Send + Sync;

/// A handler backed by a synchronous closure.
pub struct ClosureHandler {
    name: String,
    handler: Arc<HandleFn>,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("name", &self.name)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates a new closure-based handler.
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> AppResult<HandlerReport> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl Handler for ClosureHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &RequestContext) -> AppResult<HandlerReport> {
        (self.handler)(ctx)
    }
}

type CreateFn = dyn Fn() -> AppResult<Arc<dyn Handler>> + Send + Sync;

/// A factory backed by a closure that builds a fresh handler per call.
pub struct ClosureFactory {
    name: String,
    create: Arc<CreateFn>,
}

impl std::fmt::Debug for ClosureFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureFactory")
            .field("name", &self.name)
            .field("create", &"<closure>")
            .finish()
    }
}

impl ClosureFactory {
    /// Creates a new closure-based factory.
    pub fn new<F>(name: &str, create: F) -> Self
    where
        F: Fn() -> AppResult<Arc<dyn Handler>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            create: Arc::new(create),
        }
    }

    /// Wraps the factory into an `Arc<dyn HandlerFactory>`.
    pub fn shared<F>(name: &str, create: F) -> Arc<dyn HandlerFactory>
    where
        F: Fn() -> AppResult<Arc<dyn Handler>> + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, create))
    }
}

#[async_trait]
impl HandlerFactory for ClosureFactory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self) -> AppResult<Arc<dyn Handler>> {
        (self.create)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[tokio::test]
    async fn test_closure_factory_creates_fresh_handlers() {
        let factory = ClosureFactory::new("echo", || {
            Ok(Arc::new(ClosureHandler::new("echo", |ctx| {
                Ok(HandlerReport::complete().with_body(ctx.path.clone()))
            })) as Arc<dyn Handler>)
        });

        let first = factory.create().await.unwrap();
        let second = factory.create().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let report = first
            .handle(&RequestContext::new(Method::GET, "/echo"))
            .await
            .unwrap();
        assert!(report.complete);
        assert_eq!(report.body.unwrap(), "/echo");
        assert_eq!(factory.name(), "echo");
    }
}
