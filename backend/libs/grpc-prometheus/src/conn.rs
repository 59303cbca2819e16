//! Metered streaming connections
//!
//! Decorators over the transport's stream connections. Every call is
//! forwarded to the wrapped connection; successful sends and receives are
//! counted after the fact, and the client connection reports the terminal
//! outcome when its response side is closed.

use crate::code::Outcome;
use crate::reporter::CallReporter;
use crate::transport::{
    BoxClientConn, BoxHandlerConn, EncodedLen, Spec, StreamingClientConn, StreamingHandlerConn,
};
use async_trait::async_trait;
use std::sync::Arc;
use tonic::Status;
use tracing::debug;

/// Client stream connection that records into the client family set
pub struct MeteredClientConn<Req, Resp> {
    inner: BoxClientConn<Req, Resp>,
    reporter: CallReporter,
    /// First terminal receive result: `Ok` for a clean end of stream
    terminal: Option<Outcome>,
}

impl<Req, Resp> MeteredClientConn<Req, Resp>
where
    Req: EncodedLen + Send + 'static,
    Resp: EncodedLen + Send + 'static,
{
    /// Wrap `inner`; `reporter` has already recorded the start of the call
    pub fn new(inner: BoxClientConn<Req, Resp>, reporter: CallReporter) -> Self {
        Self {
            inner,
            reporter,
            terminal: None,
        }
    }
}

#[async_trait]
impl<Req, Resp> StreamingClientConn for MeteredClientConn<Req, Resp>
where
    Req: EncodedLen + Send + 'static,
    Resp: EncodedLen + Send + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn spec(&self) -> &Spec {
        self.inner.spec()
    }

    async fn send(&mut self, message: Req) -> Result<(), Status> {
        let len = message.encoded_len();
        self.inner.send(message).await?;
        self.reporter.message_sent(len);
        Ok(())
    }

    async fn close_request(&mut self) -> Result<(), Status> {
        self.inner.close_request().await
    }

    async fn receive(&mut self) -> Result<Option<Resp>, Status> {
        let result = self.inner.receive().await;
        match &result {
            Ok(Some(message)) => self.reporter.message_received(message.encoded_len()),
            Ok(None) => {
                self.terminal.get_or_insert(Outcome::Ok);
            }
            Err(status) => {
                self.terminal.get_or_insert(Outcome::of_status(Some(status)));
            }
        }
        result
    }

    async fn close_response(&mut self) -> Result<(), Status> {
        let result = self.inner.close_response().await;
        let outcome = match &result {
            Err(status) => Outcome::of_status(Some(status)),
            Ok(()) => self.terminal.unwrap_or(Outcome::Ok),
        };
        self.reporter.handled(outcome);
        result
    }
}

impl<Req, Resp> Drop for MeteredClientConn<Req, Resp> {
    fn drop(&mut self) {
        if self.reporter.is_completed() {
            return;
        }
        let outcome = self.terminal.unwrap_or(Outcome::Canceled);
        debug!(
            service = self.reporter.identity().service(),
            method = self.reporter.identity().method(),
            code = outcome.as_str(),
            "client stream dropped without close_response"
        );
        self.reporter.handled(outcome);
    }
}

/// Server stream connection that records into the server family set
///
/// The reporter is shared with the handler wrapper, which records the
/// terminal outcome once the handler returns.
pub struct MeteredHandlerConn<Req, Resp> {
    inner: BoxHandlerConn<Req, Resp>,
    reporter: Arc<CallReporter>,
}

impl<Req, Resp> MeteredHandlerConn<Req, Resp>
where
    Req: EncodedLen + Send + 'static,
    Resp: EncodedLen + Send + 'static,
{
    /// Wrap `inner`; the handler wrapper keeps `reporter` to record completion
    pub fn new(inner: BoxHandlerConn<Req, Resp>, reporter: Arc<CallReporter>) -> Self {
        Self { inner, reporter }
    }
}

#[async_trait]
impl<Req, Resp> StreamingHandlerConn for MeteredHandlerConn<Req, Resp>
where
    Req: EncodedLen + Send + 'static,
    Resp: EncodedLen + Send + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn spec(&self) -> &Spec {
        self.inner.spec()
    }

    async fn receive(&mut self) -> Result<Option<Req>, Status> {
        let result = self.inner.receive().await;
        if let Ok(Some(message)) = &result {
            self.reporter.message_received(message.encoded_len());
        }
        result
    }

    async fn send(&mut self, message: Resp) -> Result<(), Status> {
        let len = message.encoded_len();
        self.inner.send(message).await?;
        self.reporter.message_sent(len);
        Ok(())
    }
}
