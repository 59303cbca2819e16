//! Prometheus family sets for the client and server roles
//!
//! Tracks per-call RED metrics labelled by `type`, `service`, `method` and,
//! for completions, `code`.

use crate::config::{MetricsConfig, Series};
use crate::error::Result;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub(crate) const CALL_LABELS: [&str; 3] = ["type", "service", "method"];
pub(crate) const HANDLED_LABELS: [&str; 4] = ["type", "service", "method", "code"];

/// Which end of the call a family set observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    /// Role name used in default series names
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    /// `true` for the calling side
    pub const fn is_client(self) -> bool {
        matches!(self, Self::Client)
    }

    /// Default name of `series` for this role, before namespace/subsystem
    pub fn default_name(self, series: Series) -> String {
        format!("grpc_{}_{}", self.as_str(), series.suffix())
    }

    fn side(self) -> &'static str {
        match self {
            Self::Client => "client-side",
            Self::Server => "server-side",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role's bundle of labelled series
///
/// Cheap to clone; clones share the same series. Optional series are `None`
/// when disabled so recording can skip them.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Families>,
}

pub(crate) struct Families {
    pub(crate) role: Role,
    pub(crate) started: IntCounterVec,
    pub(crate) handled: IntCounterVec,
    pub(crate) handled_seconds: Option<HistogramVec>,
    pub(crate) msg_sent: IntCounterVec,
    pub(crate) msg_received: IntCounterVec,
    pub(crate) bytes_sent: Option<IntCounterVec>,
    pub(crate) bytes_received: Option<IntCounterVec>,
    pub(crate) inflight: Option<IntGaugeVec>,
}

/// Naming shared by every series of one family set
struct Namer<'a> {
    role: Role,
    config: &'a MetricsConfig,
}

impl Namer<'_> {
    fn name(&self, series: Series) -> String {
        self.config
            .names
            .get(&series)
            .cloned()
            .unwrap_or_else(|| self.role.default_name(series))
    }

    fn opts(&self, series: Series, help: String) -> Opts {
        Opts::new(self.name(series), help)
            .namespace(self.config.namespace.clone())
            .subsystem(self.config.subsystem.clone())
            .const_labels(self.config.const_labels.clone())
    }

    fn counter(&self, series: Series, help: String) -> Result<IntCounterVec> {
        Ok(IntCounterVec::new(self.opts(series, help), &CALL_LABELS)?)
    }
}

impl Metrics {
    /// Family set for the calling side
    pub fn client(config: MetricsConfig) -> Result<Self> {
        Self::new(Role::Client, config)
    }

    /// Family set for the serving side
    pub fn server(config: MetricsConfig) -> Result<Self> {
        Self::new(Role::Server, config)
    }

    /// Family set for `role`; fails on invalid names or labels
    pub fn new(role: Role, config: MetricsConfig) -> Result<Self> {
        let namer = Namer {
            role,
            config: &config,
        };
        let side = role.side();

        let started = namer.counter(
            Series::Started,
            format!("Total number of RPCs started {side}"),
        )?;
        let handled = IntCounterVec::new(
            namer.opts(Series::Handled, format!("Total number of RPCs handled {side}")),
            &HANDLED_LABELS,
        )?;
        let msg_sent = namer.counter(
            Series::MsgSent,
            format!("Total number of stream messages sent {side}"),
        )?;
        let msg_received = namer.counter(
            Series::MsgReceived,
            format!("Total number of stream messages received {side}"),
        )?;

        let handled_seconds = if config.histogram {
            let opts = HistogramOpts::new(
                namer.name(Series::HandledSeconds),
                format!("Histogram of RPCs handled {side}"),
            )
            .namespace(config.namespace.clone())
            .subsystem(config.subsystem.clone())
            .const_labels(config.const_labels.clone())
            .buckets(config.histogram_buckets.clone());
            Some(HistogramVec::new(opts, &HANDLED_LABELS)?)
        } else {
            None
        };

        let (bytes_sent, bytes_received) = if config.byte_metrics {
            (
                Some(namer.counter(
                    Series::BytesSent,
                    format!("Total number of bytes sent {side}"),
                )?),
                Some(namer.counter(
                    Series::BytesReceived,
                    format!("Total number of bytes received {side}"),
                )?),
            )
        } else {
            (None, None)
        };

        let inflight = if config.inflight_metrics {
            Some(IntGaugeVec::new(
                namer.opts(
                    Series::Inflight,
                    format!("Number of RPCs currently in flight {side}"),
                ),
                &CALL_LABELS,
            )?)
        } else {
            None
        };

        debug!(
            role = %role,
            namespace = %config.namespace,
            subsystem = %config.subsystem,
            histogram = config.histogram,
            byte_metrics = config.byte_metrics,
            inflight_metrics = config.inflight_metrics,
            "gRPC metrics family set created"
        );

        Ok(Self {
            inner: Arc::new(Families {
                role,
                started,
                handled,
                handled_seconds,
                msg_sent,
                msg_received,
                bytes_sent,
                bytes_received,
                inflight,
            }),
        })
    }

    /// Which end of the call this set observes
    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// `true` when the handled-seconds histogram is recorded
    pub fn has_histogram(&self) -> bool {
        self.inner.handled_seconds.is_some()
    }

    /// `true` when the byte counters are recorded
    pub fn has_byte_metrics(&self) -> bool {
        self.inner.bytes_sent.is_some()
    }

    /// `true` when the in-flight gauge is recorded
    pub fn has_inflight_metrics(&self) -> bool {
        self.inner.inflight.is_some()
    }

    pub(crate) fn families(&self) -> &Families {
        &self.inner
    }

    /// Register this family set with `registry`
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.clone()))?;
        Ok(())
    }

    /// Drop every recorded series; meant for test isolation
    pub fn reset(&self) {
        let f = &self.inner;
        f.started.reset();
        f.handled.reset();
        f.msg_sent.reset();
        f.msg_received.reset();
        if let Some(h) = &f.handled_seconds {
            h.reset();
        }
        if let Some(c) = &f.bytes_sent {
            c.reset();
        }
        if let Some(c) = &f.bytes_received {
            c.reset();
        }
        if let Some(g) = &f.inflight {
            g.reset();
        }
    }

    fn collectors(&self) -> Vec<&dyn Collector> {
        let f = &self.inner;
        let mut collectors: Vec<&dyn Collector> = vec![&f.started, &f.handled];
        if let Some(h) = &f.handled_seconds {
            collectors.push(h);
        }
        collectors.push(&f.msg_sent);
        collectors.push(&f.msg_received);
        if let Some(c) = &f.bytes_sent {
            collectors.push(c);
        }
        if let Some(c) = &f.bytes_received {
            collectors.push(c);
        }
        if let Some(g) = &f.inflight {
            collectors.push(g);
        }
        collectors
    }
}

impl Collector for Metrics {
    fn desc(&self) -> Vec<&Desc> {
        self.collectors()
            .into_iter()
            .flat_map(|c| c.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.collectors()
            .into_iter()
            .flat_map(|c| c.collect())
            .collect()
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("role", &self.role())
            .field("histogram", &self.has_histogram())
            .field("byte_metrics", &self.has_byte_metrics())
            .field("inflight_metrics", &self.has_inflight_metrics())
            .finish()
    }
}
