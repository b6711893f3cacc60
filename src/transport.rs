//! The seam towards the transport collaborator.
//!
//! This crate never opens sockets. A [`Transport`] is a factory of
//! [`Exchange`]s, and an exchange is one in-flight transport level
//! operation for one request. The [`Call`](crate::Call) creates the exchange
//! lazily when it starts executing, and uses it to relay cancellation.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;

use http::{Request, Response};

use crate::BoxError;

/// A raw response as produced by the transport, before body conversion.
pub type RawResponse = Response<Vec<u8>>;

/// Factory of transport level exchanges.
///
/// Timeouts, pooling, TLS and similar are all the business of the
/// implementation.
pub trait Transport<B>: Send + Sync {
    /// Create a new, not yet submitted, exchange for `request`.
    ///
    /// An error here means the request could not be turned into something the
    /// transport can send. It is reported to the caller as
    /// [`Error::Unexpected`](crate::Error::Unexpected).
    fn new_exchange(&self, request: Arc<Request<B>>) -> Result<Arc<dyn Exchange>, BoxError>;
}

/// One transport level request/response operation.
///
/// Exactly one of `execute` or `enqueue` is invoked on an exchange, at most once.
/// `abort` may be invoked from any thread, at any time, also before the
/// exchange is submitted or after it has finished.
pub trait Exchange: Send + Sync {
    /// Send the request and block until the response is received.
    fn execute(&self) -> io::Result<RawResponse>;

    /// Send the request without blocking.
    ///
    /// The outcome is reported through `completion`, from whatever thread the
    /// transport sees fit.
    fn enqueue(&self, completion: Completion);

    /// Best effort abort of the operation.
    ///
    /// An aborted operation is expected to finish with an I/O error soon, but
    /// it might also still succeed.
    fn abort(&self);
}

type OnComplete = Box<dyn FnOnce(io::Result<RawResponse>) + Send>;

/// Continuation handed to [`Exchange::enqueue`].
///
/// It can only be completed once. Dropping it without calling
/// [`Completion::complete`] completes it with an I/O error, which means the
/// caller is always notified.
///
/// That includes a completion dropped while the transport thread unwinds
/// from a panic. The function then runs during the unwind, and must not
/// panic itself, or the process aborts.
pub struct Completion {
    on_complete: Option<OnComplete>,
}

impl Completion {
    /// Wrap a function to be run with the outcome.
    pub fn new<F>(on_complete: F) -> Self
    where
        F: FnOnce(io::Result<RawResponse>) + Send + 'static,
    {
        Completion {
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Report the outcome of the exchange.
    pub fn complete(mut self, outcome: io::Result<RawResponse>) {
        if let Some(f) = self.on_complete.take() {
            f(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(f) = self.on_complete.take() {
            let reason = if thread::panicking() {
                "transport panicked with pending completion"
            } else {
                "transport dropped completion"
            };
            debug!("Completion dropped without outcome: {}", reason);
            f(Err(io::Error::new(io::ErrorKind::Other, reason)));
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.on_complete.is_some())
            .finish()
    }
}
