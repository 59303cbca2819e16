//! Error types for metrics construction and registration
//!
//! Nothing here is ever returned from an instrumented call. These errors
//! only surface while building family sets, loading configuration or
//! registering collectors.

use crate::metrics::Role;
use thiserror::Error;

/// Result type for metrics setup
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Failure while building, configuring or registering metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Invalid metric name/labels, or duplicate registration
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Environment configuration could not be parsed
    #[error("Invalid metrics configuration: {0}")]
    Config(#[from] envy::Error),

    /// A family set was bound to the wrong interceptor slot
    #[error("{actual} metrics cannot serve the {expected} role")]
    RoleMismatch { expected: Role, actual: Role },
}

impl MetricsError {
    /// `true` when a collector with the same descriptors was already registered
    pub fn is_already_registered(&self) -> bool {
        matches!(self, Self::Prometheus(prometheus::Error::AlreadyReg))
    }
}
