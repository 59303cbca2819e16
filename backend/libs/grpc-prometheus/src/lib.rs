//! # gRPC Prometheus Metrics
//!
//! Prometheus instrumentation for gRPC clients and servers, installed as an
//! interceptor around the transport's unary and streaming stages.
//!
//! ## Features
//!
//! - Started / handled counters per call type, service and method
//! - Status-code labelled outcomes, including cancellation and deadline
//!   causes buried in error chains
//! - Optional handling-time histogram, byte counters and in-flight gauge
//! - Stream message counters on both sides of a stream
//! - Process-wide default family sets registered lazily with
//!   `prometheus::default_registry()`
//!
//! ## Example
//!
//! ```rust,no_run
//! use grpc_prometheus::{Metrics, MetricsConfig, MetricsInterceptor};
//! use prometheus::Registry;
//!
//! # fn example() -> grpc_prometheus::Result<()> {
//! let registry = Registry::new();
//! let config = MetricsConfig::from_env()?
//!     .with_namespace("greet")
//!     .with_histogram(true);
//!
//! let client = Metrics::client(config.clone())?;
//! let server = Metrics::server(config)?;
//! client.register(&registry)?;
//! server.register(&registry)?;
//!
//! let interceptor = MetricsInterceptor::builder()
//!     .with_client_metrics(client)
//!     .with_server_metrics(server)
//!     .build()?;
//!
//! // hand `interceptor` to the transport; it wraps every stage it is given
//! # let _ = interceptor;
//! # Ok(())
//! # }
//! ```

mod code;
mod config;
mod conn;
mod defaults;
mod error;
mod identity;
mod interceptor;
mod metrics;
mod reporter;
pub mod transport;

pub use code::{classify, Outcome};
pub use config::{MetricsConfig, Series, ENV_PREFIX};
pub use conn::{MeteredClientConn, MeteredHandlerConn};
pub use defaults::{default_client_metrics, default_server_metrics};
pub use error::{MetricsError, Result};
pub use identity::{call_type, split_procedure, CallIdentity, UNKNOWN};
pub use interceptor::{MetricsInterceptor, MetricsInterceptorBuilder};
pub use metrics::{Metrics, Role};
pub use reporter::CallReporter;

pub use transport::{
    BoxClientConn, BoxHandlerConn, EncodedLen, Interceptor, Spec, StreamType,
    StreamingClientConn, StreamingHandlerConn, StreamingClientFunc, StreamingHandlerFunc,
    UnaryFunc,
};
