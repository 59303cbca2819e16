//! Process-wide default family sets
//!
//! Built lazily on first access and registered with
//! `prometheus::default_registry()` at that point. Importing the crate
//! registers nothing.

use crate::config::MetricsConfig;
use crate::metrics::{Metrics, Role};
use lazy_static::lazy_static;
use tracing::{debug, warn};

lazy_static! {
    static ref DEFAULT_CLIENT_METRICS: Metrics = init_default(Role::Client);
    static ref DEFAULT_SERVER_METRICS: Metrics = init_default(Role::Server);
}

/// Default client family set, created and registered on first call
pub fn default_client_metrics() -> &'static Metrics {
    &DEFAULT_CLIENT_METRICS
}

/// Default server family set, created and registered on first call
pub fn default_server_metrics() -> &'static Metrics {
    &DEFAULT_SERVER_METRICS
}

fn init_default(role: Role) -> Metrics {
    let metrics = Metrics::new(role, MetricsConfig::default())
        .expect("default gRPC metric names are valid");

    match metrics.register(prometheus::default_registry()) {
        Ok(()) => debug!(role = %role, "registered default gRPC metrics"),
        Err(e) => warn!(role = %role, error = %e, "failed to register default gRPC metrics"),
    }

    metrics
}
