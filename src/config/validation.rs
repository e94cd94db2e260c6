//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (attempts > 0, delays ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SidecarConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::SidecarConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dataplane.url '{0}' is not a valid URL")]
    InvalidDataplaneUrl(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("retries.max_attempts must be greater than 0")]
    NoAttempts,

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    DelayOrder { base: u64, max: u64 },

    #[error("topology.path must not be empty")]
    EmptyTopologyPath,

    #[error("observability.log_format '{0}' is not one of: pretty, json")]
    UnknownLogFormat(String),

    #[error("stats.port must not be 0")]
    InvalidStatsPort,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SidecarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.dataplane.url).is_err() {
        errors.push(ValidationError::InvalidDataplaneUrl(config.dataplane.url.clone()));
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(observability.log_format.clone()));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts);
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: config.retries.base_delay_ms,
            max: config.retries.max_delay_ms,
        });
    }

    if config.topology.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyTopologyPath);
    }

    if config.stats.enabled && config.stats.port == 0 {
        errors.push(ValidationError::InvalidStatsPort);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
