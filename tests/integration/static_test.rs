//! Static files served through the full stack.

use http::{StatusCode, header};

use crate::helpers::{TestApp, body_string};

#[tokio::test]
async fn test_root_serves_index_file() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html"
    );
    assert_eq!(body_string(response).await, "<h1>home</h1>");
}

#[tokio::test]
async fn test_directory_serves_its_index() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/docs").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>docs</h1>");
}

#[tokio::test]
async fn test_file_has_length_and_type() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).unwrap(),
        "15"
    );
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_string(response).await, "console.log(1);");
}

#[tokio::test]
async fn test_traversal_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/../etc/passwd").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_string(response).await,
        "Appropriate handler is not found for this request."
    );
}

#[tokio::test]
async fn test_url_prefix_limits_what_is_served() {
    let app = TestApp::with_config(|config| {
        config.plugins.static_files.url_prefix = "/assets".to_string();
    })
    .await;

    assert_eq!(app.request("GET", "/app.js").await.status(), StatusCode::NOT_FOUND);
    let response = app.request("GET", "/assets/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log(1);");
}

#[tokio::test]
async fn test_post_to_a_file_is_not_handled() {
    let app = TestApp::new().await;

    let response = app.request("POST", "/app.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
