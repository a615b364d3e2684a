//! Background maintenance configuration.

use serde::{Deserialize, Serialize};

/// Settings for the periodic sweep of abandoned chunk files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Whether the server runs the sweep.
    #[serde(default = "default_true")]
    pub chunk_sweep_enabled: bool,
    /// Unconfirmed chunk files older than this are deleted.
    #[serde(default = "default_chunk_max_age")]
    pub chunk_max_age_seconds: u64,
    /// Interval between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            chunk_sweep_enabled: true,
            chunk_max_age_seconds: default_chunk_max_age(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chunk_max_age() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    900
}
