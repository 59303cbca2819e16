//! Family set configuration
//!
//! `MetricsConfig` is the option list a family set is built from. Options
//! are applied through the `with_*` builder methods, or loaded from the
//! environment:
//!
//! ```text
//! GRPC_METRICS_HISTOGRAM=true
//! GRPC_METRICS_HISTOGRAM_BUCKETS=0.005,0.05,0.5,5
//! GRPC_METRICS_BYTE_METRICS=true
//! GRPC_METRICS_INFLIGHT_METRICS=true
//! GRPC_METRICS_NAMESPACE=nova
//! GRPC_METRICS_SUBSYSTEM=feed
//! ```
//!
//! Const labels and per-series name overrides are programmatic only.

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;

/// Default environment prefix for [`MetricsConfig::from_env`]
pub const ENV_PREFIX: &str = "GRPC_METRICS_";

/// One series of a family set, used to override its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Started,
    Handled,
    HandledSeconds,
    MsgSent,
    MsgReceived,
    BytesSent,
    BytesReceived,
    Inflight,
}

impl Series {
    /// Name suffix after the `grpc_<role>_` prefix
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Started => "started_total",
            Self::Handled => "handled_total",
            Self::HandledSeconds => "handled_seconds",
            Self::MsgSent => "msg_sent_total",
            Self::MsgReceived => "msg_received_total",
            Self::BytesSent => "bytes_sent_total",
            Self::BytesReceived => "bytes_received_total",
            Self::Inflight => "inflight_requests",
        }
    }
}

/// Options a family set is built from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record the handled-seconds histogram
    pub histogram: bool,
    /// Upper bounds of the handled-seconds buckets
    pub histogram_buckets: Vec<f64>,
    /// Record sent/received byte counters
    pub byte_metrics: bool,
    /// Track calls started but not yet handled
    pub inflight_metrics: bool,
    /// Prefix joined before the subsystem and series name
    pub namespace: String,
    /// Prefix joined between the namespace and series name
    pub subsystem: String,
    /// Labels attached to every series
    #[serde(skip)]
    pub const_labels: HashMap<String, String>,
    /// Per-series name overrides
    #[serde(skip)]
    pub names: HashMap<Series, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            histogram: false,
            histogram_buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
            byte_metrics: false,
            inflight_metrics: false,
            namespace: String::new(),
            subsystem: String::new(),
            const_labels: HashMap::new(),
            names: HashMap::new(),
        }
    }
}

impl MetricsConfig {
    /// Default options: counters only, no prefixes
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from `GRPC_METRICS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(ENV_PREFIX, std::env::vars())
    }

    /// Load options from `prefix`-ed variables; unset variables keep defaults
    pub fn from_vars<I>(prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(prefix).from_iter(vars)?)
    }

    /// Enable or disable the handled-seconds histogram
    pub fn with_histogram(mut self, enabled: bool) -> Self {
        self.histogram = enabled;
        self
    }

    /// Bucket upper bounds for the handled-seconds histogram
    pub fn with_histogram_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.histogram_buckets = buckets;
        self
    }

    /// Enable or disable the sent/received byte counters
    pub fn with_byte_metrics(mut self, enabled: bool) -> Self {
        self.byte_metrics = enabled;
        self
    }

    /// Enable or disable the in-flight gauge
    pub fn with_inflight_metrics(mut self, enabled: bool) -> Self {
        self.inflight_metrics = enabled;
        self
    }

    /// Namespace prefix for every series name
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Subsystem prefix for every series name
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Labels attached to every series of the family set
    pub fn with_const_labels<K, V>(mut self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.const_labels = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Replace the default `grpc_<role>_<suffix>` name of one series
    pub fn with_series_name(mut self, series: Series, name: impl Into<String>) -> Self {
        self.names.insert(series, name.into());
        self
    }
}
