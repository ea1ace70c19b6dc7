//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Detect duplicate mount prefixes and labels before the router does
//! - Check plugin names and their required settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::plugins::{PLUGIN_FILES, PLUGIN_STATUS};
use crate::routing::matcher;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("router.cache_capacity must be greater than zero when the cache is enabled")]
    ZeroCacheCapacity,

    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),

    #[error("prefix {0:?} is mounted more than once")]
    DuplicatePrefix(String),

    #[error("label {0:?} is used more than once")]
    DuplicateLabel(String),

    #[error("gateway at {prefix:?}: unknown plugin {plugin:?}")]
    UnknownPlugin { prefix: String, plugin: String },

    #[error("gateway at {prefix:?}: the files plugin requires a root directory")]
    MissingRoot { prefix: String },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.router.cache_enabled && config.router.cache_capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    let mut prefixes = HashSet::new();
    let mut labels = HashSet::new();
    let mut check_mount = |prefix: &str, label: &str, errors: &mut Vec<ValidationError>| {
        let normalized = matcher::normalize_path(prefix, false);
        if matcher::split_host_prefix(&normalized).is_err() {
            errors.push(ValidationError::InvalidPrefix(prefix.to_string()));
        } else if !prefixes.insert(normalized.clone()) {
            errors.push(ValidationError::DuplicatePrefix(normalized));
        }
        if !labels.insert(label.to_string()) {
            errors.push(ValidationError::DuplicateLabel(label.to_string()));
        }
    };

    if let Some(prefix) = config.router.self_prefix() {
        check_mount(prefix, &config.router.label, &mut errors);
    }

    for mount in &config.gateways {
        check_mount(&mount.prefix, mount.label(), &mut errors);
        match mount.plugin.as_str() {
            PLUGIN_STATUS => {}
            PLUGIN_FILES => {
                if mount.root.is_none() {
                    errors.push(ValidationError::MissingRoot {
                        prefix: mount.prefix.clone(),
                    });
                }
            }
            other => errors.push(ValidationError::UnknownPlugin {
                prefix: mount.prefix.clone(),
                plugin: other.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
