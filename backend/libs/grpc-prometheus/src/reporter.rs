//! Per-call lifecycle recording
//!
//! A [`CallReporter`] binds one [`CallIdentity`] to one family set for the
//! lifetime of one call. It records `started` on creation and guarantees a
//! single `handled` record: either an explicit [`CallReporter::handled`] or,
//! if the call is dropped first, a `canceled` one.

use crate::code::Outcome;
use crate::identity::CallIdentity;
use crate::metrics::Metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Records the lifecycle of one call into one family set
pub struct CallReporter {
    metrics: Metrics,
    identity: CallIdentity,
    start: Instant,
    completed: AtomicBool,
}

impl CallReporter {
    /// Record `started` (and the in-flight increment) for a new call
    pub fn start(metrics: &Metrics, identity: CallIdentity) -> Self {
        let f = metrics.families();
        let labels = identity.labels();
        f.started.with_label_values(&labels).inc();
        if let Some(inflight) = &f.inflight {
            inflight.with_label_values(&labels).inc();
        }

        Self {
            metrics: metrics.clone(),
            identity,
            start: Instant::now(),
            completed: AtomicBool::new(false),
        }
    }

    /// Labels every record of this call carries
    pub fn identity(&self) -> &CallIdentity {
        &self.identity
    }

    /// Time since the call started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// `true` once `handled` has been recorded
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// One outbound stream message of `len` encoded bytes
    pub fn message_sent(&self, len: usize) {
        let f = self.metrics.families();
        let labels = self.identity.labels();
        f.msg_sent.with_label_values(&labels).inc();
        if let Some(bytes) = &f.bytes_sent {
            bytes.with_label_values(&labels).inc_by(len as u64);
        }
    }

    /// One inbound stream message of `len` encoded bytes
    pub fn message_received(&self, len: usize) {
        let f = self.metrics.families();
        let labels = self.identity.labels();
        f.msg_received.with_label_values(&labels).inc();
        if let Some(bytes) = &f.bytes_received {
            bytes.with_label_values(&labels).inc_by(len as u64);
        }
    }

    /// Unary request payload: outbound for a client, inbound for a server
    pub fn request_bytes(&self, len: usize) {
        let f = self.metrics.families();
        let bytes = if self.metrics.role().is_client() {
            &f.bytes_sent
        } else {
            &f.bytes_received
        };
        if let Some(bytes) = bytes {
            bytes.with_label_values(&self.identity.labels()).inc_by(len as u64);
        }
    }

    /// Unary response payload: inbound for a client, outbound for a server
    pub fn response_bytes(&self, len: usize) {
        let f = self.metrics.families();
        let bytes = if self.metrics.role().is_client() {
            &f.bytes_received
        } else {
            &f.bytes_sent
        };
        if let Some(bytes) = bytes {
            bytes.with_label_values(&self.identity.labels()).inc_by(len as u64);
        }
    }

    /// Record the terminal outcome
    ///
    /// Only the first call records; later calls return `false`.
    pub fn handled(&self, outcome: Outcome) -> bool {
        if self.completed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let elapsed = self.start.elapsed().as_secs_f64();
        let f = self.metrics.families();
        let code = outcome.as_str();
        let labels = self.identity.labels_with_code(code);

        f.handled.with_label_values(&labels).inc();
        if let Some(seconds) = &f.handled_seconds {
            seconds.with_label_values(&labels).observe(elapsed);
        }
        if let Some(inflight) = &f.inflight {
            inflight.with_label_values(&self.identity.labels()).dec();
        }

        trace!(
            role = %self.metrics.role(),
            call_type = self.identity.kind(),
            service = self.identity.service(),
            method = self.identity.method(),
            code,
            elapsed,
            "gRPC call handled"
        );
        true
    }
}

impl Drop for CallReporter {
    fn drop(&mut self) {
        self.handled(Outcome::Canceled);
    }
}
