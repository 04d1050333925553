//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeout > 0, timeout within interval)
//! - Validate addresses and identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("servers[{0}] is empty")]
    EmptyServerName(usize),

    #[error("addresses.{name}: invalid socket address {value:?}")]
    InvalidAddress { name: String, value: String },

    #[error("health_check.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health_check.timeout_secs ({timeout}) exceeds interval_secs ({interval})")]
    TimeoutExceedsInterval { timeout: u64, interval: u64 },

    #[error("{field}: invalid bind address {value:?}")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingApiKey,
}

/// Check a parsed config for semantic errors.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, name) in config.servers.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyServerName(i));
        }
    }

    for (name, value) in &config.addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }

    let health = &config.health_check;
    if health.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("interval_secs"));
    }
    if health.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeout_secs"));
    }
    if health.interval_secs > 0 && health.timeout_secs > health.interval_secs {
        errors.push(ValidationError::TimeoutExceedsInterval {
            timeout: health.timeout_secs,
            interval: health.interval_secs,
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    let admin = &config.admin;
    if admin.enabled {
        if admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                field: "admin.bind_address",
                value: admin.bind_address.clone(),
            });
        }
        if admin.api_key.is_empty() {
            errors.push(ValidationError::MissingApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
