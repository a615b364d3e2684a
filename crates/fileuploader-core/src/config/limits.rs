//! Environment-level upload limits.

use serde::{Deserialize, Serialize};

/// Server-wide limits consulted by the validator but owned by the
/// environment. A value of zero means "no limit".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerLimits {
    /// Whether file uploads are accepted at all.
    #[serde(default = "default_true")]
    pub uploads_enabled: bool,
    /// Largest single file in megabytes.
    #[serde(default)]
    pub max_upload_size_mb: u64,
    /// Largest total request payload in megabytes.
    #[serde(default)]
    pub max_post_size_mb: u64,
    /// Maximum number of files per request.
    #[serde(default = "default_max_file_uploads")]
    pub max_file_uploads: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            uploads_enabled: true,
            max_upload_size_mb: 0,
            max_post_size_mb: 0,
            max_file_uploads: default_max_file_uploads(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_file_uploads() -> usize {
    20
}
