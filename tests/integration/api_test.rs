//! Integration tests for the HTTP surface.

mod helpers;

use axum::http::StatusCode;
use helpers::{Part, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_multipart_upload() {
    let app = TestApp::with_config(|config| {
        config.upload.extensions = Some(vec!["txt".into()]);
    });

    let response = app
        .request(
            "POST",
            "/upload",
            Some(&[
                Part::File("files[]", "notes.txt", "text/plain", b"first"),
                Part::File("files[]", "todo.txt", "text/plain", b"second"),
                Part::Text("comment", "ignored by the pipeline"),
            ]),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isSuccess"], true);
    assert_eq!(response.body["hasWarnings"], false);
    let files = response.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["old_name"], "notes.txt");
    assert_eq!(files[0]["uploaded"], true);
    assert!(files[0].get("temp_path").is_none());
    assert_eq!(app.stored_count(), 2);
    assert_eq!(app.spooled_count(), 0);
}

#[tokio::test]
async fn test_rejected_upload_leaves_nothing_behind() {
    let app = TestApp::with_config(|config| {
        config.upload.extensions = Some(vec!["png".into()]);
    });

    let response = app
        .request(
            "PUT",
            "/upload",
            Some(&[Part::File("files", "run.sh", "text/x-shellscript", b"#!/bin/sh")]),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isSuccess"], false);
    assert_eq!(
        response.body["warnings"],
        serde_json::json!(["File type is not allowed for run.sh"])
    );
    assert_eq!(app.stored_count(), 0);
    assert_eq!(app.spooled_count(), 0);
}

#[tokio::test]
async fn test_required_field_missing() {
    let app = TestApp::with_config(|config| {
        config.upload.required = true;
    });

    let response = app
        .request("POST", "/upload", Some(&[Part::Text("title", "holiday")]))
        .await;

    assert_eq!(response.body["isSuccess"], false);
    assert_eq!(
        response.body["warnings"],
        serde_json::json!(["No file was chosen. Please select one"])
    );
}

#[tokio::test]
async fn test_oversized_body_reported_as_warning() {
    let app = TestApp::with_config(|config| {
        config.server.max_body_bytes = 1024;
    });
    let payload = vec![b'x'; 8 * 1024];

    let response = app
        .request(
            "POST",
            "/upload",
            Some(&[Part::File("files", "big.bin", "application/octet-stream", &payload)]),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isSuccess"], false);
    assert_eq!(response.body["hasWarnings"], true);
    assert_eq!(app.stored_count(), 0);
}

#[tokio::test]
async fn test_too_many_file_parts_reported_as_warning() {
    let app = TestApp::with_config(|config| {
        config.limits.max_file_uploads = 2;
    });

    let response = app
        .request(
            "POST",
            "/upload",
            Some(&[
                Part::File("files[]", "a.txt", "text/plain", b"a"),
                Part::File("files[]", "b.txt", "text/plain", b"b"),
                Part::File("files[]", "c.txt", "text/plain", b"c"),
            ]),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isSuccess"], false);
    assert_eq!(
        response.body["warnings"],
        serde_json::json!(["Maximum number of files is exceeded"])
    );
    assert_eq!(app.stored_count(), 0);
    assert_eq!(app.spooled_count(), 0);
}

#[tokio::test]
async fn test_chunk_handshake_over_http() {
    let app = TestApp::new();
    let descriptor = r#"{"name":"big.bin","size":6,"type":"application/octet-stream","isFirst":true,"isLast":false}"#;

    let response = app
        .request(
            "POST",
            "/upload",
            Some(&[
                Part::Text("_chunkedd", descriptor),
                Part::File("files", "blob", "application/octet-stream", b"abc"),
            ]),
        )
        .await;

    let token = response.body["fileuploader"]["temp_name"]
        .as_str()
        .expect("chunk token")
        .to_string();

    let last = format!(
        r#"{{"name":"big.bin","size":6,"type":"application/octet-stream","isFirst":false,"isLast":true,"temp_name":"{token}"}}"#
    );
    let response = app
        .request(
            "POST",
            "/upload",
            Some(&[
                Part::Text("_chunkedd", &last),
                Part::File("files", "blob", "application/octet-stream", b"def"),
            ]),
        )
        .await;

    assert_eq!(response.body["isSuccess"], true);
    let stored = response.body["files"][0]["file"].as_str().unwrap();
    assert_eq!(std::fs::read(stored).unwrap(), b"abcdef");
    assert_eq!(app.stored_count(), 1);
}
