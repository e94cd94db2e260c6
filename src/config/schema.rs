//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::state::Options;

/// Root configuration for the sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SidecarConfig {
    /// Data Plane API connection.
    pub dataplane: DataplaneConfig,

    /// Options applied to every synthesized upstream.
    pub options: OptionsConfig,

    /// Where resolved TLS material is written.
    pub certs: CertsConfig,

    /// Change feed source.
    pub topology: TopologyConfig,

    /// Stats frontend.
    pub stats: StatsConfig,

    /// Apply retry policy.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl SidecarConfig {
    /// Synthesis options derived from this configuration.
    pub fn sync_options(&self) -> Options {
        Options {
            log_requests: self.options.log_requests,
            log_socket: non_empty(&self.options.log_socket),
            response_header_name: non_empty(&self.options.response_header_name),
            stats_port: self.stats.enabled.then_some(self.stats.port),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Data Plane API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataplaneConfig {
    /// Base URL (e.g., "http://127.0.0.1:5555").
    pub url: String,

    /// Basic auth user.
    pub username: String,

    /// Basic auth password.
    pub password: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DataplaneConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5555".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Per-upstream synthesis options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Enable request logging.
    pub log_requests: bool,

    /// Syslog address for request logs (empty = none).
    pub log_socket: String,

    /// Header set to "true" on every HTTP response (empty = none).
    pub response_header_name: String,
}

/// Certificate store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertsConfig {
    /// Directory receiving CA bundles and certificates.
    pub dir: PathBuf,
}

impl Default for CertsConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("mesh-sidecar").join("certs"),
        }
    }
}

/// Topology file settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Path of the topology file.
    pub path: PathBuf,

    /// File watcher poll interval in seconds.
    pub poll_interval_secs: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("topology.toml"),
            poll_interval_secs: 2,
        }
    }
}

/// Stats frontend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8484,
        }
    }
}

/// Retry configuration for applying state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per pass, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// How often a failed pass is retried when no new topology arrives.
    pub resync_interval_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            resync_interval_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
