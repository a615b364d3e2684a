//! Shared test helpers for HTTP integration tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fileuploader_api::{AppState, build_app};
use fileuploader_core::config::AppConfig;

const BOUNDARY: &str = "fileuploader-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Upload directory
    pub uploads: TempDir,
    /// Spool directory for incoming parts
    pub spool: TempDir,
}

/// Parsed test response
pub struct TestResponse {
    /// HTTP status
    pub status: StatusCode,
    /// JSON body
    pub body: Value,
}

/// One multipart part.
pub enum Part<'a> {
    /// A plain form field.
    Text(&'a str, &'a str),
    /// A file part: field name, file name, content type, bytes.
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

impl TestApp {
    /// Create a test application with default settings
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test application, adjusting the configuration first
    pub fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let uploads = tempfile::tempdir().expect("upload dir");
        let spool = tempfile::tempdir().expect("spool dir");

        let mut config = AppConfig::default();
        config.upload.upload_dir = uploads.path().to_path_buf();
        config.server.temp_dir = Some(spool.path().to_path_buf());
        configure(&mut config);

        Self {
            router: build_app(AppState::new(config)),
            uploads,
            spool,
        }
    }

    /// Send a request with an optional multipart body
    pub async fn request(&self, method: &str, uri: &str, parts: Option<&[Part<'_>]>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match parts {
            Some(parts) => builder
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts))),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Number of entries in the upload directory
    pub fn stored_count(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).unwrap().count()
    }

    /// Number of entries left in the spool directory
    pub fn spooled_count(&self) -> usize {
        std::fs::read_dir(self.spool.path()).unwrap().count()
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
