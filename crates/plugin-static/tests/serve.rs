//! Static files served through a full pipeline.

use plexus_core::config::plugin::StaticFilesConfig;
use plexus_pipeline::http::{Method, StatusCode, header};
use plexus_pipeline::testing::MemoryStream;
use plexus_pipeline::{Pipeline, PipelineOptions};
use plexus_plugin::{PluginDescriptor, PluginManager};
use plugin_static::static_plugin;

async fn pipeline(config: &StaticFilesConfig) -> Pipeline {
    let manager = PluginManager::default();
    manager
        .register(vec![PluginDescriptor::new("core"), static_plugin(config)])
        .await
        .unwrap();
    manager.start().await.unwrap();
    Pipeline::build(
        manager.take_handler_factories().await.unwrap(),
        PipelineOptions::default(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_index_is_served_for_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();
    let pipeline = pipeline(&StaticFilesConfig {
        root: dir.path().to_path_buf(),
        ..StaticFilesConfig::default()
    })
    .await;

    let mut stream = MemoryStream::new(Method::GET, "/");
    pipeline.handle(&mut stream).await;

    let response = stream.response().unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.file.as_deref(), Some(dir.path().join("index.html").as_path()));
    assert!(
        response
            .headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
async fn test_missing_file_falls_through_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&StaticFilesConfig {
        root: dir.path().to_path_buf(),
        ..StaticFilesConfig::default()
    })
    .await;

    let mut stream = MemoryStream::new(Method::GET, "/missing.png");
    pipeline.handle(&mut stream).await;

    assert_eq!(stream.response().unwrap().status, StatusCode::NOT_FOUND);
}
