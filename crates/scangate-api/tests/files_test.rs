//! Bucket passthrough integration tests.
//!
//! Run with: `cargo test -p scangate-api --test files_test`

mod helpers;

use axum::http::Method;
use bytes::Bytes;
use helpers::setup_test_app;
use serde_json::Value;

#[tokio::test]
async fn test_get_missing_object_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get("/file/missing.txt").await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.text(), "Object not found");
}

#[tokio::test]
async fn test_put_then_get_round_trip_keeps_content_type() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .put("/file/notes/today.txt")
        .content_type("text/plain")
        .bytes(Bytes::from_static(b"remember the milk"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "Object uploaded successfully");

    let response = app.client().get("/file/notes/today.txt").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/plain");
    assert_eq!(response.as_bytes().as_ref(), b"remember the milk");
}

#[tokio::test]
async fn test_get_without_stored_content_type_defaults_to_octet_stream() {
    let app = setup_test_app().await;
    app.storage
        .put("raw.bin", Bytes::from_static(&[0, 1, 2]), None)
        .await
        .unwrap();

    let response = app.client().get("/file/raw.bin").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/octet-stream");
    assert_eq!(response.as_bytes().as_ref(), b"\x00\x01\x02");
}

#[tokio::test]
async fn test_list_returns_metadata_without_bodies() {
    let app = setup_test_app().await;
    app.storage
        .put("b.txt", Bytes::from_static(b"bbbb"), Some("text/plain"))
        .await
        .unwrap();
    app.storage
        .put("a.txt", Bytes::from_static(b"aa"), None)
        .await
        .unwrap();

    for path in ["/file", "/file/"] {
        let response = app.client().get(path).await;
        assert_eq!(response.status_code(), 200, "path {}", path);

        let body: Value = response.json();
        let objects = body.as_array().expect("listing is an array");
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["key"], "a.txt");
        assert_eq!(objects[0]["size"], 2);
        assert_eq!(objects[1]["key"], "b.txt");
        assert_eq!(objects[1]["size"], 4);
        assert_eq!(objects[1]["httpMetadata"]["contentType"], "text/plain");
        assert!(objects.iter().all(|o| o.get("data").is_none()));
    }
}

#[tokio::test]
async fn test_list_empty_bucket() {
    let app = setup_test_app().await;

    let response = app.client().get("/file").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_put_overwrites_existing_object() {
    let app = setup_test_app().await;

    app.client()
        .put("/file/report.csv")
        .content_type("text/csv")
        .bytes(Bytes::from_static(b"v1"))
        .await;
    app.client()
        .put("/file/report.csv")
        .content_type("text/csv")
        .bytes(Bytes::from_static(b"version two"))
        .await;

    let response = app.client().get("/file/report.csv").await;
    assert_eq!(response.as_bytes().as_ref(), b"version two");
    assert_eq!(app.stored_keys().await, vec!["report.csv".to_string()]);
}

#[tokio::test]
async fn test_put_with_empty_segment_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .put("/file/a//b")
        .bytes(Bytes::from_static(b"x"))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_file_routes_reject_other_methods() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .method(Method::DELETE, "/file/report.csv")
        .await;
    assert_eq!(response.status_code(), 405);
    assert_eq!(response.text(), "Method not allowed");

    let response = app.client().post("/file").await;
    assert_eq!(response.status_code(), 405);
}

#[tokio::test]
async fn test_paths_prefixed_with_file_stay_in_passthrough() {
    let app = setup_test_app().await;

    let response = app.client().get("/filex").await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.text(), "Object not found");

    let response = app
        .client()
        .put("/files")
        .bytes(Bytes::from_static(b"x"))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.stored_keys().await.is_empty());

    let response = app.client().post("/files").await;
    assert_eq!(response.status_code(), 405);
    assert_eq!(response.text(), "Method not allowed");
}
