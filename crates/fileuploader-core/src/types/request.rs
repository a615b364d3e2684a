//! Explicit request state handed to the upload pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::warning::UploadWarning;
use crate::config::limits::ServerLimits;

/// Post field carrying single-file editor parameters.
pub const EDITOR_FIELD: &str = "_editorr";

/// HTTP method of the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
    Other,
}

impl HttpMethod {
    /// Parse a method name, case-insensitively.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }

    /// Whether the method submits a form body.
    pub fn is_post_like(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// One file as delivered by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawFile {
    /// Client-side file name.
    #[serde(default)]
    pub name: String,
    /// Location of the received bytes.
    #[serde(rename = "tmp_name", default)]
    pub temp_path: PathBuf,
    /// Declared mime type.
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Transport error code, `0` for success.
    #[serde(default)]
    pub error: u16,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// Files submitted under one field name as parallel lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParallelFiles {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub tmp_name: Vec<PathBuf>,
    #[serde(rename = "type", default)]
    pub mime_type: Vec<String>,
    #[serde(default)]
    pub error: Vec<u16>,
    #[serde(default)]
    pub size: Vec<u64>,
}

/// Raw input of one field in any of the shapes a transport produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFileInput {
    /// A single file.
    Single(RawFile),
    /// Parallel lists of names, paths, types, errors, and sizes.
    Parallel(ParallelFiles),
    /// A list of files.
    List(Vec<RawFile>),
}

impl RawFileInput {
    /// Normalize into a list of files.
    ///
    /// Parallel lists are transposed by position of `name`; missing values
    /// in the other lists default to empty.
    pub fn into_files(self) -> Vec<RawFile> {
        match self {
            Self::Single(file) => vec![file],
            Self::List(files) => files,
            Self::Parallel(lists) => lists
                .name
                .iter()
                .enumerate()
                .map(|(i, name)| RawFile {
                    name: name.clone(),
                    temp_path: lists.tmp_name.get(i).cloned().unwrap_or_default(),
                    mime_type: lists.mime_type.get(i).cloned().unwrap_or_default(),
                    error: lists.error.get(i).copied().unwrap_or_default(),
                    size: lists.size.get(i).copied().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Low-level condition the transport observed before any file was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentDiagnostic {
    /// The request body exceeded the configured size.
    PostSizeExceeded,
    /// More files were sent than the server accepts.
    TooManyFiles,
}

impl EnvironmentDiagnostic {
    /// Warning reported for this condition.
    pub fn warning(self) -> UploadWarning {
        match self {
            Self::PostSizeExceeded => UploadWarning::PostTooLarge,
            Self::TooManyFiles => UploadWarning::TooManyFiles,
        }
    }
}

/// Everything the upload pipeline reads from the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Submission method.
    pub method: HttpMethod,
    /// File inputs by field name.
    pub files: HashMap<String, RawFileInput>,
    /// Plain post fields.
    pub fields: HashMap<String, String>,
    /// Environment limits in effect.
    pub limits: ServerLimits,
    /// Condition observed by the transport, if any.
    pub diagnostic: Option<EnvironmentDiagnostic>,
}

impl RequestContext {
    /// Create an empty context.
    pub fn new(method: HttpMethod, limits: ServerLimits) -> Self {
        Self {
            method,
            limits,
            ..Self::default()
        }
    }

    /// Attach the input of a file field.
    pub fn with_files(mut self, field: impl Into<String>, input: RawFileInput) -> Self {
        self.files.insert(field.into(), input);
        self
    }

    /// Attach a post field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Record a transport diagnostic.
    pub fn with_diagnostic(mut self, diagnostic: EnvironmentDiagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    /// Value of a post field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
