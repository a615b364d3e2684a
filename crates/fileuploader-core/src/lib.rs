//! # fileuploader-core
//!
//! Core crate for FileUploader. Contains the collaborator traits,
//! configuration schemas, upload domain types, the warning taxonomy,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other FileUploader crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
