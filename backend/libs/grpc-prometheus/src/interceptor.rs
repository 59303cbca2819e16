//! Metrics interceptor
//!
//! Binds an optional client family set and an optional server family set
//! and implements the transport's three wrapping points. A role without a
//! family set is never instrumented: its stages are returned untouched.

use crate::code::Outcome;
use crate::conn::{MeteredClientConn, MeteredHandlerConn};
use crate::defaults::{default_client_metrics, default_server_metrics};
use crate::error::{MetricsError, Result};
use crate::identity::CallIdentity;
use crate::metrics::{Metrics, Role};
use crate::reporter::CallReporter;
use crate::transport::{
    BoxClientConn, BoxHandlerConn, EncodedLen, Interceptor, Spec, StreamingClientFunc,
    StreamingHandlerFunc, UnaryFunc,
};
use futures::FutureExt;
use std::sync::Arc;
use tonic::Request;
use tracing::debug;

/// Records client and server call metrics around the transport's stages
#[derive(Clone, Debug)]
pub struct MetricsInterceptor {
    client: Option<Metrics>,
    server: Option<Metrics>,
}

impl MetricsInterceptor {
    /// Interceptor backed by the process-wide default family sets
    ///
    /// The defaults are created and registered with
    /// `prometheus::default_registry()` on first use.
    pub fn new() -> Self {
        Self {
            client: Some(default_client_metrics().clone()),
            server: Some(default_server_metrics().clone()),
        }
    }

    /// Builder binding explicit family sets; unset roles stay uninstrumented
    pub fn builder() -> MetricsInterceptorBuilder {
        MetricsInterceptorBuilder::default()
    }

    /// Family set recording the calling side, if instrumented
    pub fn client_metrics(&self) -> Option<&Metrics> {
        self.client.as_ref()
    }

    /// Family set recording the serving side, if instrumented
    pub fn server_metrics(&self) -> Option<&Metrics> {
        self.server.as_ref()
    }

    fn metrics_for(&self, spec: &Spec) -> Option<&Metrics> {
        if spec.is_client {
            self.client.as_ref()
        } else {
            self.server.as_ref()
        }
    }
}

impl Default for MetricsInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for MetricsInterceptor {
    fn wrap_unary<Req, Resp>(&self, next: UnaryFunc<Req, Resp>) -> UnaryFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static,
    {
        if self.client.is_none() && self.server.is_none() {
            return next;
        }

        let this = self.clone();
        Arc::new(move |spec: Spec, request: Request<Req>| {
            let Some(metrics) = this.metrics_for(&spec).cloned() else {
                return next(spec, request);
            };
            let next = next.clone();

            async move {
                let reporter = CallReporter::start(&metrics, CallIdentity::resolve(&spec));
                reporter.request_bytes(request.get_ref().encoded_len());

                let result = next(spec, request).await;

                if let Ok(response) = &result {
                    reporter.response_bytes(response.get_ref().encoded_len());
                }
                reporter.handled(Outcome::of_result(&result));
                result
            }
            .boxed()
        })
    }

    fn wrap_streaming_client<Req, Resp>(
        &self,
        next: StreamingClientFunc<Req, Resp>,
    ) -> StreamingClientFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static,
    {
        let Some(metrics) = self.client.clone() else {
            return next;
        };

        Arc::new(move |spec: Spec| -> BoxClientConn<Req, Resp> {
            let reporter = CallReporter::start(&metrics, CallIdentity::resolve(&spec));
            let conn = next(spec);
            Box::new(MeteredClientConn::new(conn, reporter))
        })
    }

    fn wrap_streaming_handler<Req, Resp>(
        &self,
        next: StreamingHandlerFunc<Req, Resp>,
    ) -> StreamingHandlerFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static,
    {
        let Some(metrics) = self.server.clone() else {
            return next;
        };

        Arc::new(move |conn: BoxHandlerConn<Req, Resp>| {
            let metrics = metrics.clone();
            let next = next.clone();

            async move {
                let identity = CallIdentity::resolve(conn.spec());
                let reporter = Arc::new(CallReporter::start(&metrics, identity));
                let conn: BoxHandlerConn<Req, Resp> =
                    Box::new(MeteredHandlerConn::new(conn, reporter.clone()));

                let result = next(conn).await;

                reporter.handled(Outcome::of_result(&result));
                result
            }
            .boxed()
        })
    }
}

/// Builder for [`MetricsInterceptor`]
///
/// A role left unset is not instrumented: its stages pass through untouched.
/// Only [`MetricsInterceptor::new`] binds the process-wide defaults.
///
/// ```rust,no_run
/// use grpc_prometheus::{Metrics, MetricsConfig, MetricsInterceptor};
/// use prometheus::Registry;
///
/// # fn example() -> grpc_prometheus::Result<()> {
/// let registry = Registry::new();
/// let client = Metrics::client(MetricsConfig::new().with_histogram(true))?;
/// client.register(&registry)?;
///
/// // client-side only: server stages pass through untouched
/// let interceptor = MetricsInterceptor::builder()
///     .with_client_metrics(client)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MetricsInterceptorBuilder {
    client: Option<Metrics>,
    server: Option<Metrics>,
}

impl MetricsInterceptorBuilder {
    /// Instrument the calling side with `metrics`
    pub fn with_client_metrics(mut self, metrics: Metrics) -> Self {
        self.client = Some(metrics);
        self
    }

    /// Instrument the serving side with `metrics`
    pub fn with_server_metrics(mut self, metrics: Metrics) -> Self {
        self.server = Some(metrics);
        self
    }

    /// Fails when a family set is bound to the other role's slot
    pub fn build(self) -> Result<MetricsInterceptor> {
        check_role(self.client.as_ref(), Role::Client)?;
        check_role(self.server.as_ref(), Role::Server)?;

        debug!(
            client = self.client.is_some(),
            server = self.server.is_some(),
            "gRPC metrics interceptor built"
        );

        Ok(MetricsInterceptor {
            client: self.client,
            server: self.server,
        })
    }
}

fn check_role(metrics: Option<&Metrics>, expected: Role) -> Result<()> {
    match metrics {
        Some(metrics) if metrics.role() != expected => Err(MetricsError::RoleMismatch {
            expected,
            actual: metrics.role(),
        }),
        _ => Ok(()),
    }
}
