//! Plugin manager: drives registration, start, and stop in level order.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use plexus_core::config::plugin::PluginConfig;
use plexus_core::{AppError, AppResult};
use plexus_pipeline::{HandlerFactory, panic_message};

use crate::command::CommandDescriptor;
use crate::descriptor::PluginDescriptor;
use crate::events::{EventBus, LifecycleEvent};
use crate::hook::Hook;
use crate::levels::Levels;
use crate::registry::Registry;
use crate::report::{
    FailureReason, PluginFailure, PluginState, PluginStatus, StartReport, StopReport,
};

/// Options applied to every hook invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleOptions {
    /// Upper bound for one hook. Unbounded when `None`.
    pub hook_timeout: Option<Duration>,
}

impl LifecycleOptions {
    /// Builds options from configuration.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self {
            hook_timeout: config.hook_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Registering,
    Starting,
    Started,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone)]
struct Record {
    state: PluginState,
    error: Option<String>,
    since: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    registry: Registry,
    records: BTreeMap<String, Record>,
    phase: Phase,
    factories_taken: bool,
}

/// Owns the plugin registry and drives every plugin through its lifecycle.
///
/// Start walks the levels ascending and stop walks them descending. Hooks
/// of one level run concurrently and all of them finish before the next
/// level begins, so a plugin never starts before its dependencies or stops
/// after them.
#[derive(Debug, Default)]
pub struct PluginManager {
    options: LifecycleOptions,
    inner: RwLock<Inner>,
    events: EventBus,
}

impl PluginManager {
    /// Creates a manager with no plugins.
    pub fn new(options: LifecycleOptions) -> Self {
        Self {
            options,
            inner: RwLock::new(Inner::default()),
            events: EventBus::default(),
        }
    }

    /// The bus lifecycle events are published on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Registers plugins and recomputes the levels.
    ///
    /// Duplicate names, unknown dependencies, and cycles are configuration
    /// errors; on error nothing from this batch is registered.
    pub async fn register(&self, descriptors: Vec<PluginDescriptor>) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner.phase != Phase::Registering {
            return Err(AppError::validation(
                "Plugins cannot be registered after start",
            ));
        }

        let inner = &mut *inner;
        inner.registry.extend(descriptors).inspect_err(|e| {
            error!(error = %e, "Plugin registration failed");
        })?;

        for name in inner.registry.names() {
            inner.records.entry(name.to_string()).or_insert(Record {
                state: PluginState::Registered,
                error: None,
                since: Utc::now(),
            });
        }
        for (index, level) in inner.registry.levels().iter().enumerate() {
            debug!(level = index, plugins = ?level, "Plugin level computed");
        }
        info!(
            plugins = inner.registry.len(),
            levels = inner.registry.levels().len(),
            "Plugins registered"
        );
        Ok(())
    }

    /// Runs init hooks level by level.
    ///
    /// A failing hook marks its plugin failed and every dependent is
    /// skipped; unrelated plugins still start. Can only be called once.
    pub async fn start(&self) -> AppResult<StartReport> {
        let registry = {
            let mut inner = self.inner.write().await;
            if inner.phase != Phase::Registering {
                return Err(AppError::validation("Plugins have already been started"));
            }
            inner.phase = Phase::Starting;
            inner.registry.clone()
        };

        let mut states: BTreeMap<String, PluginState> = BTreeMap::new();
        let mut report = StartReport::default();

        for (index, level) in registry.levels().iter().enumerate() {
            info!(level = index, plugins = level.len(), "Starting plugin level");

            let mut runnable = Vec::new();
            for name in level {
                let Some(descriptor) = registry.get(name) else {
                    continue;
                };
                let blocked = descriptor
                    .dependencies
                    .iter()
                    .find(|dep| states.get(dep.as_str()) != Some(&PluginState::Started));
                match blocked {
                    Some(dependency) => {
                        warn!(
                            plugin = %name,
                            dependency = %dependency,
                            "Skipping plugin because a dependency did not start"
                        );
                        states.insert(name.clone(), PluginState::SkippedByDependency);
                        report.failures.push(PluginFailure {
                            plugin: name.clone(),
                            reason: FailureReason::Dependency(dependency.clone()),
                        });
                        self.events
                            .publish(LifecycleEvent::Skipped {
                                plugin: name.clone(),
                                level: index,
                                dependency: dependency.clone(),
                            })
                            .await;
                    }
                    None => runnable.push(descriptor),
                }
            }

            let results = join_all(runnable.iter().map(|d| {
                run_hook(&d.name, "init", d.init_hook.clone(), self.options.hook_timeout)
            }))
            .await;

            for (descriptor, result) in runnable.into_iter().zip(results) {
                match result {
                    Ok(()) => {
                        info!(plugin = %descriptor.name, level = index, "Plugin started");
                        states.insert(descriptor.name.clone(), PluginState::Started);
                        report.started.push(descriptor.name.clone());
                        self.events
                            .publish(LifecycleEvent::Started {
                                plugin: descriptor.name.clone(),
                                level: index,
                            })
                            .await;
                    }
                    Err(reason) => {
                        error!(plugin = %descriptor.name, error = %reason, "Plugin failed to start");
                        states.insert(descriptor.name.clone(), PluginState::Failed);
                        self.events
                            .publish(LifecycleEvent::Failed {
                                plugin: descriptor.name.clone(),
                                level: index,
                                reason: reason.to_string(),
                            })
                            .await;
                        report.failures.push(PluginFailure {
                            plugin: descriptor.name.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        let mut inner = self.inner.write().await;
        apply(&mut inner.records, states, &report.failures);
        inner.phase = Phase::Started;

        info!(
            started = report.started.len(),
            failed = report.failures.len(),
            "Plugin start finished"
        );
        Ok(report)
    }

    /// Runs stop hooks of started plugins, dependents first.
    ///
    /// Failures are logged and collected; every started plugin gets its
    /// stop hook invoked. Does nothing unless the plugins were started.
    pub async fn stop(&self) -> StopReport {
        let (registry, started) = {
            let mut inner = self.inner.write().await;
            if inner.phase != Phase::Started {
                warn!("Stop requested while plugins are not running");
                return StopReport::default();
            }
            inner.phase = Phase::Stopping;
            let started: BTreeSet<String> = inner
                .records
                .iter()
                .filter(|(_, r)| r.state == PluginState::Started)
                .map(|(name, _)| name.clone())
                .collect();
            (inner.registry.clone(), started)
        };

        let mut states: BTreeMap<String, PluginState> = BTreeMap::new();
        let mut report = StopReport::default();

        for (index, level) in registry.levels().iter().enumerate().rev() {
            let targets: Vec<&PluginDescriptor> = level
                .iter()
                .filter(|name| started.contains(*name))
                .filter_map(|name| registry.get(name))
                .collect();
            if targets.is_empty() {
                continue;
            }
            info!(level = index, plugins = targets.len(), "Stopping plugin level");

            let results = join_all(targets.iter().map(|d| {
                run_hook(&d.name, "stop", d.stop_hook.clone(), self.options.hook_timeout)
            }))
            .await;

            for (descriptor, result) in targets.into_iter().zip(results) {
                match result {
                    Ok(()) => {
                        info!(plugin = %descriptor.name, "Plugin stopped");
                        states.insert(descriptor.name.clone(), PluginState::Stopped);
                        report.stopped.push(descriptor.name.clone());
                        self.events
                            .publish(LifecycleEvent::Stopped {
                                plugin: descriptor.name.clone(),
                                level: index,
                            })
                            .await;
                    }
                    Err(reason) => {
                        error!(plugin = %descriptor.name, error = %reason, "Plugin failed to stop");
                        states.insert(descriptor.name.clone(), PluginState::Failed);
                        self.events
                            .publish(LifecycleEvent::Failed {
                                plugin: descriptor.name.clone(),
                                level: index,
                                reason: reason.to_string(),
                            })
                            .await;
                        report.failures.push(PluginFailure {
                            plugin: descriptor.name.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        let mut inner = self.inner.write().await;
        apply(&mut inner.records, states, &report.failures);
        inner.phase = Phase::Stopped;

        info!(
            stopped = report.stopped.len(),
            failed = report.failures.len(),
            "All plugins stopped"
        );
        report
    }

    /// Hands out the handler factories of started plugins.
    ///
    /// Order: levels ascending, plugin name within a level, declaration
    /// order within a plugin. Available once, after start.
    pub async fn take_handler_factories(&self) -> AppResult<Vec<Arc<dyn HandlerFactory>>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if inner.phase != Phase::Started {
            return Err(AppError::validation(
                "Handler factories are available only after start",
            ));
        }
        if inner.factories_taken {
            return Err(AppError::validation(
                "Handler factories have already been taken",
            ));
        }

        let mut factories = Vec::new();
        for name in inner.registry.levels().flatten() {
            let started = inner
                .records
                .get(name)
                .is_some_and(|r| r.state == PluginState::Started);
            if let (true, Some(descriptor)) = (started, inner.registry.get(name)) {
                factories.extend(descriptor.handler_factories.iter().cloned());
            }
        }
        inner.factories_taken = true;

        debug!(factories = factories.len(), "Handler factories taken");
        Ok(factories)
    }

    /// Snapshot of every plugin, in level order.
    pub async fn statuses(&self) -> Vec<PluginStatus> {
        let inner = self.inner.read().await;
        let levels = inner.registry.levels();
        levels
            .flatten()
            .into_iter()
            .filter_map(|name| {
                let descriptor = inner.registry.get(name)?;
                let record = inner.records.get(name)?;
                Some(PluginStatus {
                    name: name.to_string(),
                    version: descriptor.version.clone(),
                    level: levels.level_of(name).unwrap_or_default(),
                    state: record.state,
                    error: record.error.clone(),
                    since: record.since,
                })
            })
            .collect()
    }

    /// The current dependency levels.
    pub async fn levels(&self) -> Levels {
        self.inner.read().await.registry.levels().clone()
    }

    /// Commands contributed by started plugins, in level order.
    pub async fn commands(&self) -> Vec<CommandDescriptor> {
        let inner = self.inner.read().await;
        inner
            .registry
            .levels()
            .flatten()
            .into_iter()
            .filter(|name| {
                inner
                    .records
                    .get(*name)
                    .is_some_and(|r| r.state == PluginState::Started)
            })
            .filter_map(|name| inner.registry.get(name))
            .flat_map(|d| d.commands.iter().cloned())
            .collect()
    }

    /// Registered descriptors in name order.
    pub async fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.inner.read().await.registry.descriptors().cloned().collect()
    }
}

fn apply(
    records: &mut BTreeMap<String, Record>,
    states: BTreeMap<String, PluginState>,
    failures: &[PluginFailure],
) {
    let now = Utc::now();
    for (name, state) in states {
        if let Some(record) = records.get_mut(&name) {
            record.state = state;
            record.since = now;
        }
    }
    for failure in failures {
        if let Some(record) = records.get_mut(&failure.plugin) {
            record.error = Some(failure.reason.to_string());
        }
    }
}

async fn run_hook(
    plugin: &str,
    phase: &str,
    hook: Option<Arc<dyn Hook>>,
    timeout: Option<Duration>,
) -> Result<(), FailureReason> {
    let Some(hook) = hook else {
        debug!(plugin = %plugin, phase = %phase, "No hook to run");
        return Ok(());
    };

    let invocation = AssertUnwindSafe(hook.run()).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, invocation).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(FailureReason::Timeout(limit)),
        },
        None => invocation.await,
    };

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(FailureReason::Hook(hook_error(&e))),
        Err(panic) => Err(FailureReason::Hook(format!(
            "{phase} hook panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

/// The error message followed by its causes.
fn hook_error(e: &AppError) -> String {
    std::iter::once(e.message.clone())
        .chain(e.trace().into_iter().skip(1))
        .collect::<Vec<_>>()
        .join(": ")
}
