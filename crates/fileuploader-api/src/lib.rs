//! # fileuploader-api
//!
//! HTTP layer for FileUploader built on Axum.
//!
//! Receives multipart submissions, spools file parts to temporary files,
//! hands the request to the upload pipeline, and serializes its outcome.
//! Also runs the periodic stale-chunk sweep alongside the server.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
