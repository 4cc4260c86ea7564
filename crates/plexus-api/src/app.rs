//! Application builder: wraps the pipeline in an Axum router and serves it.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use plexus_core::config::AppConfig;
use plexus_core::{AppError, AppResult, ErrorKind};
use plexus_pipeline::{Pipeline, PipelineOptions};

use crate::plugins::start_plugins;
use crate::stream::AxumStream;

/// Builds the Axum application. Every request, whatever its path, goes
/// through the pipeline.
pub fn build_app(pipeline: Pipeline) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
}

/// Runs the Plexus server until a shutdown signal arrives.
///
/// Plugins are started, the pipeline is built from their handler
/// factories, and requests are served. Plugins are stopped on the way out
/// whether serving succeeded or not.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!("Starting Plexus server...");

    let (manager, report) = start_plugins(&config).await?;
    if !report.is_clean() {
        for failure in &report.failures {
            warn!(plugin = %failure.plugin, reason = %failure.reason, "Plugin not started");
        }
    }

    let served: AppResult<()> = async {
        let factories = manager.take_handler_factories().await?;
        let options = PipelineOptions::from_config(&config.pipeline, config.dev_mode)?;
        let pipeline = Pipeline::build(factories, options).await?;
        info!(handlers = ?pipeline.handler_names(), "Handler chain frozen");

        let addr = config.server.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, format!("Failed to bind {addr}"), e)
        })?;
        serve(
            listener,
            build_app(pipeline),
            shutdown_signal(),
            Duration::from_secs(config.server.shutdown_grace_seconds),
        )
        .await
    }
    .await;

    let stopped = manager.stop().await;
    if !stopped.is_clean() {
        warn!(failed = stopped.failures.len(), "Some plugins did not stop cleanly");
    }

    info!("Plexus server shut down");
    served
}

async fn dispatch(State(pipeline): State<Pipeline>, request: Request) -> Response {
    let mut stream = AxumStream::new(request);
    pipeline.handle(&mut stream).await;
    stream.into_response()
}

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// In-flight requests get `grace` to finish after shutdown begins; open
/// connections are dropped after that.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Plexus server listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(server_error),
        _ = signalled_rx => {
            info!(grace_seconds = grace.as_secs(), "Shutdown signal received, draining connections");
        }
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.map_err(server_error),
        Err(_) => {
            warn!("Graceful shutdown timed out, dropping open connections");
            Ok(())
        }
    }
}

fn server_error(e: std::io::Error) -> AppError {
    AppError::with_source(ErrorKind::Transport, "Server error", e)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
