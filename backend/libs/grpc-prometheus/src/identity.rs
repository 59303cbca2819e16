//! Call identity: the `type`, `service` and `method` labels of a call

use crate::transport::{Spec, StreamType};

/// Label value used when a route cannot be split into service and method
pub const UNKNOWN: &str = "unknown";

/// Label-ready identity of one call, resolved once at call start
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallIdentity {
    kind: &'static str,
    service: String,
    method: String,
}

impl CallIdentity {
    /// Resolve identity from a route and a stream type
    ///
    /// Never fails: a route without a separator resolves to
    /// `unknown`/`unknown` so hostile paths cannot grow label cardinality
    /// through this resolver.
    pub fn new(procedure: &str, stream_type: StreamType) -> Self {
        let (service, method) = split_procedure(procedure);
        Self {
            kind: call_type(stream_type),
            service: service.to_owned(),
            method: method.to_owned(),
        }
    }

    /// Identity of the call `spec` describes
    pub fn resolve(spec: &Spec) -> Self {
        Self::new(&spec.procedure, spec.stream_type)
    }

    /// `type` label value
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// `service` label value
    pub fn service(&self) -> &str {
        &self.service
    }

    /// `method` label value
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Values for `["type", "service", "method"]`
    pub fn labels(&self) -> [&str; 3] {
        [self.kind, &self.service, &self.method]
    }

    /// Values for `["type", "service", "method", "code"]`
    pub fn labels_with_code<'a>(&'a self, code: &'a str) -> [&'a str; 4] {
        [self.kind, &self.service, &self.method, code]
    }
}

/// Split `/<service>/<method>` (leading slash optional) on the first separator
pub fn split_procedure(procedure: &str) -> (&str, &str) {
    let procedure = procedure.strip_prefix('/').unwrap_or(procedure);
    procedure.split_once('/').unwrap_or((UNKNOWN, UNKNOWN))
}

/// `type` label value for a stream type
pub const fn call_type(stream_type: StreamType) -> &'static str {
    match stream_type {
        StreamType::Unary => "unary",
        StreamType::ClientStream => "client_stream",
        StreamType::ServerStream => "server_stream",
        StreamType::Bidi => "bidi",
        StreamType::Unknown => UNKNOWN,
    }
}
