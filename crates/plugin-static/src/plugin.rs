//! The `static` plugin descriptor.

use std::sync::Arc;

use plexus_core::AppError;
use plexus_core::config::plugin::StaticFilesConfig;
use plexus_pipeline::{ClosureFactory, Handler};
use plexus_plugin::{
    ArgumentSpec, ClosureAction, ClosureHook, CommandDescriptor, CommandInvocation,
    PluginDescriptor,
};
use tracing::info;

use crate::handler::StaticHandler;

/// Name of the static file plugin.
pub const STATIC_PLUGIN: &str = "static";

/// Builds the `static` plugin.
///
/// The init hook fails when the root is not an accessible directory, which
/// leaves the plugin unstarted without affecting the others.
pub fn static_plugin(config: &StaticFilesConfig) -> PluginDescriptor {
    let root = config.root.clone();
    let handler = StaticHandler::new(config);
    let resolver = handler.clone();

    PluginDescriptor::new(STATIC_PLUGIN)
        .version(env!("CARGO_PKG_VERSION"))
        .description("Serves files from a directory")
        .depends_on("core")
        .on_init(ClosureHook::new("static-init", move || {
            let root = root.clone();
            async move {
                let metadata = tokio::fs::metadata(&root).await.map_err(|e| {
                    AppError::hook(format!(
                        "Static root '{}' is not accessible: {e}",
                        root.display()
                    ))
                })?;
                if !metadata.is_dir() {
                    return Err(AppError::hook(format!(
                        "Static root '{}' is not a directory",
                        root.display()
                    )));
                }
                info!(root = %root.display(), "Static file root ready");
                Ok(())
            }
        }))
        .handler(ClosureFactory::shared("static-files", move || {
            Ok(Arc::new(handler.clone()) as Arc<dyn Handler>)
        }))
        .command(
            CommandDescriptor::new(
                "resolve",
                ClosureAction::new(move |invocation: CommandInvocation| {
                    let resolver = resolver.clone();
                    async move {
                        let path = invocation.argument("path").unwrap_or("/").to_string();
                        match resolver.resolve(&path).await {
                            Some(file) => println!("{path} -> {}", file.display()),
                            None => println!("{path} -> (not served)"),
                        }
                        Ok(())
                    }
                }),
            )
            .realm(STATIC_PLUGIN)
            .description("Show which file a request path is served from")
            .argument(ArgumentSpec::optional("path", "Request path", Some("/"))),
        )
}
