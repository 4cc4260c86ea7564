//! Lifecycle hook capability.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use plexus_core::AppResult;

/// A zero-argument lifecycle operation that may fail.
#[async_trait]
pub trait Hook: Send + Sync + std::fmt::Debug {
    /// Runs the hook.
    async fn run(&self) -> AppResult<()>;
}

type HookFn = dyn Fn() -> BoxFuture<'static, AppResult<()>> + Send + Sync;

/// A hook backed by an async closure.
pub struct ClosureHook {
    label: String,
    hook: Arc<HookFn>,
}

impl std::fmt::Debug for ClosureHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHook")
            .field("label", &self.label)
            .field("hook", &"<closure>")
            .finish()
    }
}

impl ClosureHook {
    /// Creates a new closure-based hook.
    pub fn new<F, Fut>(label: &str, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self {
            label: label.to_string(),
            hook: Arc::new(move || -> BoxFuture<'static, AppResult<()>> { Box::pin(hook()) }),
        }
    }

    /// The label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl Hook for ClosureHook {
    async fn run(&self) -> AppResult<()> {
        (self.hook)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::AppError;

    #[tokio::test]
    async fn test_closure_hook_runs_each_time() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let c = counter.clone();
        let hook = ClosureHook::new("count", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        });

        hook.run().await.unwrap();
        hook.run().await.unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_closure_hook_propagates_error() {
        let hook = ClosureHook::new("fail", || async { Err(AppError::hook("no database")) });
        let err = hook.run().await.unwrap_err();
        assert_eq!(err.message, "no database");
    }
}
