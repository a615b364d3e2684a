//! # fileuploader-service
//!
//! The upload pipeline for FileUploader. [`UploadService`] drives one
//! field's submission end to end: input normalization, request and file
//! validation, chunk reassembly, naming, reconciliation against the
//! client's file list, persistence, image post-processing, and ordering.
//!
//! Collaborators (persistence, custom validation, image codec) follow
//! constructor injection and are held as `Arc` trait objects.

pub mod field;
pub mod format;
pub mod upload;

pub use field::UploadField;
pub use format::format_size;
pub use upload::{ImagePostProcessor, ListReconciler, UploadService, UploadValidator};
