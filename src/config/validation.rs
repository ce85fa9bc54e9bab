//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool bounds ordered)
//! - Check that mount prefixes can actually be mounted
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;
use crate::routing::cascade::is_valid_prefix;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `timeouts.request_secs`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check `config` for values serde accepts but the server cannot use.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.pool.max_size < config.pool.initial_size {
        errors.push(ValidationError::new(
            "pool.max_size",
            format!(
                "{} is smaller than pool.initial_size ({})",
                config.pool.max_size, config.pool.initial_size
            ),
        ));
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not a valid filter directive", config.observability.log_level),
        ));
    }

    let cors = &config.headers.cors;
    if cors.preflight && !cors.enabled {
        errors.push(ValidationError::new(
            "headers.cors.preflight",
            "requires headers.cors.enabled",
        ));
    }
    if cors.preflight && cors.allowed_methods.is_empty() {
        errors.push(ValidationError::new(
            "headers.cors.allowed_methods",
            "must not be empty when preflight is enabled",
        ));
    }

    let files = &config.static_files;
    if files.enabled {
        if files.root.is_empty() {
            errors.push(ValidationError::new("static_files.root", "must not be empty"));
        }
        if !files.prefix.is_empty() && !is_valid_prefix(&files.prefix) {
            errors.push(ValidationError::new(
                "static_files.prefix",
                format!("'{}' must look like '/name' with letters and digits only", files.prefix),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
