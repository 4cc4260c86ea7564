//! Plugin startup outcomes as seen from the HTTP surface.

use http::StatusCode;

use plexus_plugin::PluginState;

use crate::helpers::{TestApp, body_string};

#[tokio::test]
async fn test_default_plugins_start_clean() {
    let app = TestApp::new().await;

    assert!(app.report.is_clean());
    assert_eq!(app.report.started, vec!["core", "static"]);

    let levels = app.manager.levels().await;
    assert_eq!(levels.level_of("core"), Some(0));
    assert_eq!(levels.level_of("static"), Some(1));
}

#[tokio::test]
async fn test_missing_static_root_leaves_other_plugins_serving() {
    let app = TestApp::with_config(|config| {
        config.plugins.static_files.root = "/nonexistent/plexus-web".into();
    })
    .await;

    assert_eq!(app.report.failed_names(), vec!["static"]);
    let statuses = app.manager.statuses().await;
    let core = statuses.iter().find(|s| s.name == "core").unwrap();
    let stat = statuses.iter().find(|s| s.name == "static").unwrap();
    assert_eq!(core.state, PluginState::Started);
    assert_eq!(stat.state, PluginState::Failed);
    assert!(stat.error.as_deref().unwrap().contains("not accessible"));

    assert_eq!(app.request("GET", "/health").await.status(), StatusCode::OK);
    assert_eq!(app.request("GET", "/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disabled_static_plugin_is_not_registered() {
    let app = TestApp::with_config(|config| {
        config.plugins.disabled = vec!["static".to_string()];
    })
    .await;

    assert_eq!(app.report.started, vec!["core"]);
    assert_eq!(app.request("GET", "/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stop_after_serving_is_clean() {
    let app = TestApp::new().await;
    assert_eq!(app.request("GET", "/health").await.status(), StatusCode::OK);

    let report = app.manager.stop().await;
    assert!(report.is_clean());
    assert_eq!(report.stopped, vec!["static", "core"]);
}

#[tokio::test]
async fn test_method_policy_comes_from_config() {
    let app = TestApp::with_config(|config| {
        config.pipeline.allowed_methods = vec!["GET".to_string()];
    })
    .await;

    let response = app.request("HEAD", "/health").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(http::header::ALLOW).unwrap(), "GET");
    assert_eq!(body_string(response).await, "Only GET methods are allowed.");
}
