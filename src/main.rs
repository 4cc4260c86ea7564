//! Plexus server entry point.
//!
//! Loads configuration, initializes logging, and hands over to
//! [`plexus_api::run_server`].

use tracing_subscriber::{EnvFilter, fmt};

use plexus_core::AppResult;
use plexus_core::config::AppConfig;
use plexus_core::config::logging::LoggingConfig;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);
    tracing::info!("Starting Plexus v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = plexus_api::run_server(config).await {
        tracing::error!(kind = %e.kind, "Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> AppResult<AppConfig> {
    let config_path =
        std::env::var("PLEXUS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(Some(&config_path))
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
