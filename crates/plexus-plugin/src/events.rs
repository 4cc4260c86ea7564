//! Lifecycle events and the bus that delivers them.
//!
//! The bus is owned by a [`PluginManager`](crate::PluginManager); there is
//! no process-wide instance. Listeners subscribe to one [`EventKind`] and are
//! awaited in subscription order. A listener error or panic is logged and
//! never reaches the publisher. Every event is also sent on a broadcast
//! channel for observers that want the whole stream.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error};

use plexus_core::AppResult;
use plexus_pipeline::panic_message;

const DEFAULT_CAPACITY: usize = 256;

/// Event categories listeners subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A plugin's init hook succeeded.
    Started,
    /// A plugin's init or stop hook failed.
    Failed,
    /// A plugin was not started because a dependency did not start.
    Skipped,
    /// A plugin's stop hook ran.
    Stopped,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "plugin.started"),
            Self::Failed => write!(f, "plugin.failed"),
            Self::Skipped => write!(f, "plugin.skipped"),
            Self::Stopped => write!(f, "plugin.stopped"),
        }
    }
}

/// What happened to a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Init hook succeeded.
    Started {
        /// Plugin name.
        plugin: String,
        /// Dependency level.
        level: usize,
    },
    /// Init or stop hook failed.
    Failed {
        /// Plugin name.
        plugin: String,
        /// Dependency level.
        level: usize,
        /// Rendered failure reason.
        reason: String,
    },
    /// Skipped because `dependency` did not start.
    Skipped {
        /// Plugin name.
        plugin: String,
        /// Dependency level.
        level: usize,
        /// The dependency that did not start.
        dependency: String,
    },
    /// Stop hook ran.
    Stopped {
        /// Plugin name.
        plugin: String,
        /// Dependency level.
        level: usize,
    },
}

impl LifecycleEvent {
    /// The category of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started { .. } => EventKind::Started,
            Self::Failed { .. } => EventKind::Failed,
            Self::Skipped { .. } => EventKind::Skipped,
            Self::Stopped { .. } => EventKind::Stopped,
        }
    }

    /// The plugin the event is about.
    pub fn plugin(&self) -> &str {
        match self {
            Self::Started { plugin, .. }
            | Self::Failed { plugin, .. }
            | Self::Skipped { plugin, .. }
            | Self::Stopped { plugin, .. } => plugin,
        }
    }

    /// The plugin's dependency level.
    pub fn level(&self) -> usize {
        match self {
            Self::Started { level, .. }
            | Self::Failed { level, .. }
            | Self::Skipped { level, .. }
            | Self::Stopped { level, .. } => *level,
        }
    }
}

/// A published event with metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PluginEvent {
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: LifecycleEvent,
}

impl PluginEvent {
    /// Wraps a payload, stamped now.
    pub fn new(payload: LifecycleEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Reacts to published events.
#[async_trait]
pub trait EventListener: Send + Sync + fmt::Debug {
    /// Handles one event. Errors are logged by the bus.
    async fn on_event(&self, event: &PluginEvent) -> AppResult<()>;
}

type ListenerFn = dyn Fn(PluginEvent) -> BoxFuture<'static, AppResult<()>> + Send + Sync;

/// A listener backed by an async closure.
pub struct ClosureListener {
    listener: Arc<ListenerFn>,
}

impl fmt::Debug for ClosureListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureListener")
            .field("listener", &"<closure>")
            .finish()
    }
}

impl ClosureListener {
    /// Creates a new closure-based listener.
    pub fn new<F, Fut>(listener: F) -> Self
    where
        F: Fn(PluginEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self {
            listener: Arc::new(move |event| -> BoxFuture<'static, AppResult<()>> {
                Box::pin(listener(event))
            }),
        }
    }
}

#[async_trait]
impl EventListener for ClosureListener {
    async fn on_event(&self, event: &PluginEvent) -> AppResult<()> {
        (self.listener)(event.clone()).await
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    /// The kind the listener is subscribed to.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Delivers lifecycle events to subscribed listeners.
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<(u64, Arc<dyn EventListener>)>>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<PluginEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus whose broadcast channel buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            sender: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Adds a listener for `kind`.
    pub async fn subscribe(
        &self,
        kind: EventKind,
        listener: impl EventListener + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .await
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        debug!(event = %kind, subscription = id, "Listener subscribed");
        Subscription { id, kind }
    }

    /// Removes a listener. Unknown subscriptions are ignored.
    pub async fn unsubscribe(&self, subscription: Subscription) {
        if let Some(listeners) = self.listeners.write().await.get_mut(&subscription.kind) {
            listeners.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// A receiver for every event published from now on.
    pub fn watch(&self) -> broadcast::Receiver<PluginEvent> {
        self.sender.subscribe()
    }

    /// Number of listeners subscribed to `kind`.
    pub async fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .await
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Delivers `payload` to its listeners, then to watchers.
    pub async fn publish(&self, payload: LifecycleEvent) {
        let event = PluginEvent::new(payload);
        let kind = event.payload.kind();
        let listeners: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .await
            .get(&kind)
            .map(|l| l.iter().map(|(_, listener)| listener.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            match AssertUnwindSafe(listener.on_event(&event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(event = %kind, plugin = %event.payload.plugin(), error = %e, "Event listener failed");
                }
                Err(panic) => {
                    error!(
                        event = %kind,
                        plugin = %event.payload.plugin(),
                        panic = %panic_message(panic.as_ref()),
                        "Event listener panicked"
                    );
                }
            }
        }

        let _ = self.sender.send(event);
    }
}
