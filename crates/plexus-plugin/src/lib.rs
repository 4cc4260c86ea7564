//! # plexus-plugin
//!
//! Plugin lifecycle orchestration. Plugins are described by
//! [`PluginDescriptor`]s, arranged into dependency [`Levels`] by the
//! [`Registry`], and driven through start and stop by the
//! [`PluginManager`], which publishes each transition on its [`EventBus`].
//! Started plugins contribute the handler factories the request pipeline
//! is built from.

pub mod command;
pub mod descriptor;
pub mod events;
pub mod hook;
pub mod levels;
pub mod manager;
pub mod registry;
pub mod report;

pub use command::{
    ArgumentSpec, ClosureAction, CommandAction, CommandDescriptor, CommandInvocation, OptionSpec,
};
pub use descriptor::PluginDescriptor;
pub use events::{
    ClosureListener, EventBus, EventKind, EventListener, LifecycleEvent, PluginEvent, Subscription,
};
pub use hook::{ClosureHook, Hook};
pub use levels::Levels;
pub use manager::{LifecycleOptions, PluginManager};
pub use registry::Registry;
pub use report::{FailureReason, PluginFailure, PluginState, PluginStatus, StartReport, StopReport};
