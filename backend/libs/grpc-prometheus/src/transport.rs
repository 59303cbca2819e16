//! Hook contract consumed from the RPC transport
//!
//! The transport owns dispatch. It hands each pipeline stage to an
//! [`Interceptor`] and receives back a stage with the same shape. Three
//! stage shapes exist:
//!
//! - [`UnaryFunc`]: one request, one response
//! - [`StreamingClientFunc`]: opens a client-side stream connection
//! - [`StreamingHandlerFunc`]: serves an inbound stream connection
//!
//! Payloads travel as `tonic::Request` / `tonic::Response`, failures as
//! `tonic::Status`. Every message type must report its encoded size through
//! [`EncodedLen`], which holds for any `prost::Message`.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Shape of the request/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Unary,
    ClientStream,
    ServerStream,
    Bidi,
    /// Transport could not tell the call shape
    Unknown,
}

/// Static description of one call, as declared by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    /// Route in `/<service>/<method>` form
    pub procedure: String,
    pub stream_type: StreamType,
    /// `true` on the calling side, `false` on the serving side
    pub is_client: bool,
}

impl Spec {
    /// Spec for `procedure` on the given side of the call
    pub fn new(procedure: impl Into<String>, stream_type: StreamType, is_client: bool) -> Self {
        Self {
            procedure: procedure.into(),
            stream_type,
            is_client,
        }
    }

    /// Client-side spec for `procedure`
    pub fn client(procedure: impl Into<String>, stream_type: StreamType) -> Self {
        Self::new(procedure, stream_type, true)
    }

    /// Server-side spec for `procedure`
    pub fn server(procedure: impl Into<String>, stream_type: StreamType) -> Self {
        Self::new(procedure, stream_type, false)
    }

    /// Same call, seen from the other end of the wire
    pub fn peer(&self) -> Self {
        Self {
            procedure: self.procedure.clone(),
            stream_type: self.stream_type,
            is_client: !self.is_client,
        }
    }
}

/// Encoded byte length of a message on the wire
///
/// Implemented for every `prost::Message`; `prost` computes the length
/// without encoding the message.
pub trait EncodedLen {
    fn encoded_len(&self) -> usize;
}

impl<M: prost::Message> EncodedLen for M {
    fn encoded_len(&self) -> usize {
        prost::Message::encoded_len(self)
    }
}

/// Client side of a streaming call
#[async_trait]
pub trait StreamingClientConn: Send {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn spec(&self) -> &Spec;

    async fn send(&mut self, message: Self::Request) -> Result<(), Status>;

    /// Half-close: no more requests will be sent
    async fn close_request(&mut self) -> Result<(), Status>;

    /// `Ok(None)` marks a clean end of stream
    async fn receive(&mut self) -> Result<Option<Self::Response>, Status>;

    /// Tear down the response side; the call is over after this
    async fn close_response(&mut self) -> Result<(), Status>;
}

/// Server side of a streaming call, as seen by the handler
#[async_trait]
pub trait StreamingHandlerConn: Send {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn spec(&self) -> &Spec;

    /// `Ok(None)` marks a clean end of stream
    async fn receive(&mut self) -> Result<Option<Self::Request>, Status>;

    async fn send(&mut self, message: Self::Response) -> Result<(), Status>;
}

/// Owned client stream connection
pub type BoxClientConn<Req, Resp> =
    Box<dyn StreamingClientConn<Request = Req, Response = Resp>>;

/// Owned server stream connection
pub type BoxHandlerConn<Req, Resp> =
    Box<dyn StreamingHandlerConn<Request = Req, Response = Resp>>;

/// Unary stage: one request in, one response or status out
pub type UnaryFunc<Req, Resp> = Arc<
    dyn Fn(Spec, Request<Req>) -> BoxFuture<'static, Result<Response<Resp>, Status>>
        + Send
        + Sync,
>;

/// Opens a client stream connection for a call
pub type StreamingClientFunc<Req, Resp> =
    Arc<dyn Fn(Spec) -> BoxClientConn<Req, Resp> + Send + Sync>;

/// Serves one inbound stream connection to completion
pub type StreamingHandlerFunc<Req, Resp> =
    Arc<dyn Fn(BoxHandlerConn<Req, Resp>) -> BoxFuture<'static, Result<(), Status>> + Send + Sync>;

/// The three wrapping points a transport invokes
///
/// Each method receives the next stage of the pipeline and returns a stage
/// of the same shape.
pub trait Interceptor {
    fn wrap_unary<Req, Resp>(&self, next: UnaryFunc<Req, Resp>) -> UnaryFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static;

    fn wrap_streaming_client<Req, Resp>(
        &self,
        next: StreamingClientFunc<Req, Resp>,
    ) -> StreamingClientFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static;

    fn wrap_streaming_handler<Req, Resp>(
        &self,
        next: StreamingHandlerFunc<Req, Resp>,
    ) -> StreamingHandlerFunc<Req, Resp>
    where
        Req: EncodedLen + Send + 'static,
        Resp: EncodedLen + Send + 'static;
}
