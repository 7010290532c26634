//! Upload endpoint integration tests.
//!
//! Run with: `cargo test -p scangate-api --test upload_test`

mod helpers;

use axum_test::multipart::MultipartForm;
use helpers::{setup_test_app, setup_test_app_with_scanner_url, upload_form};
use mockito::Matcher;
use serde_json::{json, Value};

fn sorted_files(body: &Value) -> Vec<Value> {
    let mut files = body["Files"].as_array().cloned().unwrap_or_default();
    files.sort_by(|a, b| {
        a["Filename"]
            .as_str()
            .unwrap_or_default()
            .cmp(b["Filename"].as_str().unwrap_or_default())
    });
    files
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/upload")
        .multipart(MultipartForm::new().add_text("comment", "hello"))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.text(), "No files found in the request");
}

#[tokio::test]
async fn test_upload_with_non_multipart_body_is_bad_request() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/upload")
        .text("plain body")
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_clean_file_is_reported_and_not_stored() {
    let mut app = setup_test_app().await;
    let mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::UrlEncoded("fn".into(), "a.txt".into()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/")
        .multipart(upload_form(&[("a.txt", "hello")]))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "Success": "true",
            "Files": [{"Success": true, "Filename": "a.txt", "Reason": "Scanned"}]
        })
    );
    mock.assert_async().await;
    assert!(app.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_malicious_file_is_stored() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"Success":true,"Message":"Malicious"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("b.exe", "MZ payload")]))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["Success"], "false");
    assert_eq!(
        body["Files"][0],
        json!({"Success": true, "Filename": "b.exe", "Reason": "Malicious"})
    );

    assert_eq!(app.stored_keys().await, vec!["b.exe".to_string()]);
    let stored = app.storage.get("b.exe").await.unwrap();
    assert_eq!(&stored.data[..], b"MZ payload");
}

#[tokio::test]
async fn test_mixed_batch_stores_every_file() {
    let mut app = setup_test_app().await;
    let _clean = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::UrlEncoded("fn".into(), "a.txt".into()))
        .with_status(200)
        .create_async()
        .await;
    let _malicious = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::UrlEncoded("fn".into(), "b.exe".into()))
        .with_status(403)
        .with_body(r#"{"Success":true,"Message":"Malicious"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("a.txt", "hello"), ("b.exe", "MZ payload")]))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["Success"], "false");
    assert_eq!(
        sorted_files(&body),
        vec![
            json!({"Success": true, "Filename": "a.txt", "Reason": "Scanned"}),
            json!({"Success": true, "Filename": "b.exe", "Reason": "Malicious"}),
        ]
    );
    assert_eq!(
        app.stored_keys().await,
        vec!["a.txt".to_string(), "b.exe".to_string()]
    );
}

#[tokio::test]
async fn test_failed_scan_is_reported_and_stored() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"Success":false,"Message":"Failed"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("c.pdf", "%PDF")]))
        .await;

    let body: Value = response.json();
    assert_eq!(body["Success"], "false");
    assert_eq!(
        body["Files"][0],
        json!({"Success": false, "Filename": "c.pdf", "Reason": "Failed"})
    );
    assert_eq!(app.stored_keys().await, vec!["c.pdf".to_string()]);
}

#[tokio::test]
async fn test_scanned_verdict_with_error_status_keeps_batch_successful() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(r#"{"Success":true,"Message":"Scanned"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("d.txt", "hello")]))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "Success": "true",
            "Files": [{"Success": false, "Filename": "d.txt", "Reason": "Failed"}]
        })
    );
    assert!(app.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_unknown_verdict_uses_scanner_message() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(422)
        .with_body(r#"{"Success":false,"Message":"Quarantined"}"#)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("d.zip", "PK")]))
        .await;

    let body: Value = response.json();
    assert_eq!(body["Success"], "false");
    assert_eq!(body["Files"][0]["Reason"], "Quarantined");
    assert_eq!(body["Files"][0]["Success"], false);
    assert_eq!(app.stored_keys().await, vec!["d.zip".to_string()]);
}

#[tokio::test]
async fn test_unparseable_scanner_response_is_unknown_error() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("e.bin", "data")]))
        .await;

    let body: Value = response.json();
    assert_eq!(
        body["Files"][0],
        json!({"Success": false, "Filename": "e.bin", "Reason": "unknown error"})
    );
    assert_eq!(app.stored_keys().await, vec!["e.bin".to_string()]);
}

#[tokio::test]
async fn test_unreachable_scanner_reports_upload_failed() {
    // Nothing listens on the discard port.
    let app = setup_test_app_with_scanner_url("http://127.0.0.1:9/upload").await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("a.txt", "hello")]))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "Success": "false",
            "Files": [{"Success": false, "Filename": "a.txt", "Reason": "upload failed"}]
        })
    );
    assert!(app.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_text_entry_in_written_batch_is_invalid_file_type() {
    let mut app = setup_test_app().await;
    let _mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"Success":true,"Message":"Malicious"}"#)
        .create_async()
        .await;

    let form = upload_form(&[("b.exe", "MZ payload")]).add_text("file", "not a file");
    let response = app.client().post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.text(), "Invalid file type");
    assert!(app.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_inbound_headers_are_forwarded_to_scanner() {
    let mut app = setup_test_app().await;
    let mock = app
        .scanner
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .match_header("x-tenant-id", "acme")
        .match_header("user-agent", "MUS Forwarder")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let response = app
        .client()
        .post("/upload")
        .add_header("x-tenant-id", "acme")
        .multipart(upload_form(&[("a.txt", "hello")]))
        .await;

    assert_eq!(response.status_code(), 200);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upload_routes_reject_other_methods() {
    let app = setup_test_app().await;

    let response = app.client().get("/upload").await;
    assert_eq!(response.status_code(), 405);
    assert_eq!(response.text(), "Method not allowed");

    let response = app.client().put("/").await;
    assert_eq!(response.status_code(), 405);
    assert_eq!(response.text(), "Method not allowed");
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let app = setup_test_app().await;

    for path in ["/nope", "/upload/extra", "/uploads"] {
        let response = app.client().get(path).await;
        assert_eq!(response.status_code(), 404, "path {}", path);
        assert_eq!(response.text(), "Not found");
    }
}
