//! HTTP server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Name of the multipart form field carrying the files.
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Directory where incoming multipart files are spooled.
    /// Defaults to the system temporary directory.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            field_name: default_field_name(),
            max_body_bytes: default_max_body_bytes(),
            temp_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_field_name() -> String {
    "files".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}
