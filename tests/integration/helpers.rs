//! Shared test helpers for integration tests.

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, Response};
use tempfile::TempDir;
use tower::ServiceExt;

use plexus_api::build_app;
use plexus_api::plugins::start_plugins;
use plexus_core::config::AppConfig;
use plexus_pipeline::{Pipeline, PipelineOptions};
use plexus_plugin::{PluginManager, StartReport};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The manager the router's handlers came from
    pub manager: PluginManager,
    /// Report of the startup pass
    pub report: StartReport,
    /// Static root; removed on drop
    pub web_root: TempDir,
}

impl TestApp {
    /// A server with the compiled-in plugins and a populated static root.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`], with `configure` applied to the config first.
    pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let web_root = tempfile::tempdir().unwrap();
        std::fs::write(web_root.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(web_root.path().join("docs")).unwrap();
        std::fs::write(web_root.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
        std::fs::write(web_root.path().join("app.js"), "console.log(1);").unwrap();

        let mut config = AppConfig::default();
        config.plugins.static_files.root = web_root.path().to_path_buf();
        configure(&mut config);

        let (manager, report) = start_plugins(&config).await.unwrap();
        let factories = manager.take_handler_factories().await.unwrap();
        let options = PipelineOptions::from_config(&config.pipeline, config.dev_mode).unwrap();
        let pipeline = Pipeline::build(factories, options).await.unwrap();

        Self {
            router: build_app(pipeline),
            manager,
            report,
            web_root,
        }
    }

    /// Sends one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a bodiless request.
    pub async fn request(&self, method: &str, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Reads a response body to a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
