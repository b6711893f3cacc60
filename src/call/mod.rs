//! The call handle.
//!
//! A [`Call`] is one attempt at sending one request. It moves through these
//! states, and never back:
//!
//! ```text
//!                   ┌──────────────────┐
//!          ┌────────│     Created      │────────┐
//!          │        └──────────────────┘        │
//!          │ execute/enqueue                    │ execute/enqueue
//!          ▼                                    │ when canceled
//! ┌──────────────────┐                          │
//! │    Executing     │──────────┐               │
//! └──────────────────┘          │               │
//!          │                    │               │
//!          ▼                    ▼               │
//! ┌──────────────────┐ ┌──────────────────┐     │
//! │    Completed     │ │      Failed      │◀────┘
//! └──────────────────┘ └──────────────────┘
//! ```
//!
//! Cancellation is a flag that can be raised in any state. It lives in the
//! same atomic word as the state, so a call canceled in `Created` can never
//! reach `Executing`. A call canceled in `Executing` has its transport
//! exchange aborted.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use http::Request;
use parking_lot::Mutex;

use crate::convert::{to_response, ResponseConverter};
use crate::transport::{Completion, Exchange, RawResponse, Transport};
use crate::{Error, Response};

#[cfg(test)]
mod test;

/// Lifecycle state of a [`Call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Not yet executed or enqueued.
    Created,
    /// The transport is working on the request.
    Executing,
    /// A response was delivered.
    Completed,
    /// An error was delivered.
    Failed,
}

impl CallState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => CallState::Created,
            1 => CallState::Executing,
            2 => CallState::Completed,
            3 => CallState::Failed,
            _ => unreachable!("Unknown call state: {}", v),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            CallState::Created => 0,
            CallState::Executing => 1,
            CallState::Completed => 2,
            CallState::Failed => 3,
        }
    }
}

/// An invocation that sends a request to a server and returns a response.
///
/// Each call yields its own request/response pair. Use [`Clone`] to make
/// another call with the same request, for instance to retry or poll.
///
/// Calls are executed either blocking with [`Call::execute`] or
/// non-blocking with [`Call::enqueue`], but only once. In both cases the call
/// can be canceled at any time with [`Call::cancel`], from any thread.
pub struct Call<T, B = ()> {
    request: Arc<Request<B>>,
    transport: Arc<dyn Transport<B>>,
    converter: Arc<dyn ResponseConverter<T>>,
    shared: Arc<Shared>,
}

// Bit set in the state word once the call is canceled.
const CANCELED: u8 = 0b1000_0000;

// State touched both by the caller and the transport completion thread.
struct Shared {
    // CallState in the low bits, plus CANCELED.
    state: AtomicU8,
    // Present while executing.
    exchange: Mutex<Option<Arc<dyn Exchange>>>,
}

impl<T, B> Call<T, B> {
    /// Create a new call for a finalized request.
    pub fn new(
        request: Request<B>,
        transport: Arc<dyn Transport<B>>,
        converter: Arc<dyn ResponseConverter<T>>,
    ) -> Self {
        Call::from_parts(Arc::new(request), transport, converter)
    }

    fn from_parts(
        request: Arc<Request<B>>,
        transport: Arc<dyn Transport<B>>,
        converter: Arc<dyn ResponseConverter<T>>,
    ) -> Self {
        let call = Call {
            request,
            transport,
            converter,
            shared: Arc::new(Shared::new()),
        };

        debug!("{:?}", call);

        call
    }

    /// The request this call sends.
    pub fn request(&self) -> &Request<B> {
        &self.request
    }

    /// The current lifecycle state.
    pub fn state(&self) -> CallState {
        self.shared.state()
    }

    /// Whether this call has been executed or enqueued.
    ///
    /// It is an error to execute or enqueue a call more than once.
    pub fn is_executed(&self) -> bool {
        self.shared.state() != CallState::Created
    }

    /// Whether [`Call::cancel`] was called.
    pub fn is_canceled(&self) -> bool {
        self.shared.is_canceled()
    }

    /// Cancel this call.
    ///
    /// A call not yet executed never will be: a later `execute` or `enqueue`
    /// fails with [`Error::Canceled`] without contacting the transport. An
    /// in-flight call has its exchange aborted, which is best effort.
    ///
    /// Repeated calls do nothing.
    pub fn cancel(&self) {
        if !self.shared.set_canceled() {
            return;
        }

        debug!("Cancel {:?}", self);

        // Clone out to not hold the lock while the transport aborts.
        let exchange = self.shared.exchange.lock().clone();

        if let Some(exchange) = exchange {
            debug!("Abort in-flight exchange");
            exchange.abort();
        }
    }

    /// Send the request and block until the response is received.
    ///
    /// Errors are:
    ///
    /// * [`Error::AlreadyExecuted`] if this call was executed or enqueued before.
    /// * [`Error::Canceled`] if the call was canceled before or while running.
    /// * [`Error::Io`] if a problem occurred talking to the server.
    /// * [`Error::Unexpected`] creating the request or converting the response.
    pub fn execute(&self) -> Result<Response<T>, Error> {
        let exchange = self.begin()?;

        let outcome = exchange.execute();

        self.shared.finish(outcome, &*self.converter)
    }

    /// Send the request without blocking, and report the outcome to `callback`.
    ///
    /// The callback is invoked exactly once, from a thread of the transport's
    /// choosing, with either the response or the error. The only error
    /// returned directly is [`Error::AlreadyExecuted`], in which case the
    /// callback is not invoked.
    ///
    /// If the call is already canceled, the callback is invoked with
    /// [`Error::Canceled`] on the calling thread, before this function returns.
    pub fn enqueue<F>(&self, callback: F) -> Result<(), Error>
    where
        F: FnOnce(Result<Response<T>, Error>) + Send + 'static,
        T: 'static,
    {
        let exchange = match self.begin() {
            Ok(v) => v,
            Err(e @ Error::AlreadyExecuted) => return Err(e),
            Err(e) => {
                callback(Err(e));
                return Ok(());
            }
        };

        let shared = self.shared.clone();
        let converter = self.converter.clone();

        let completion = Completion::new(move |outcome| {
            let result = shared.finish(outcome, &*converter);
            callback(result);
        });

        exchange.enqueue(completion);

        Ok(())
    }

    /// Move out of `Created` and obtain the exchange.
    fn begin(&self) -> Result<Arc<dyn Exchange>, Error> {
        self.shared.start()?;

        let exchange = match self.transport.new_exchange(self.request.clone()) {
            Ok(v) => v,
            Err(e) => {
                self.shared.set_terminal(CallState::Failed);
                return Err(Error::unexpected(e));
            }
        };

        // Either cancel() finds the exchange in the slot, or we see the flag here.
        let canceled = {
            let mut slot = self.shared.exchange.lock();
            *slot = Some(exchange.clone());
            self.shared.is_canceled()
        };

        if canceled {
            self.shared.set_terminal(CallState::Failed);
            return Err(Error::Canceled);
        }

        Ok(exchange)
    }
}

impl Shared {
    fn new() -> Self {
        Shared {
            state: AtomicU8::new(CallState::Created.as_u8()),
            exchange: Mutex::new(None),
        }
    }

    fn state(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire) & !CANCELED)
    }

    fn is_canceled(&self) -> bool {
        self.state.load(Ordering::Acquire) & CANCELED != 0
    }

    /// Raise the cancel bit. True for the caller that raised it first.
    fn set_canceled(&self) -> bool {
        self.state.fetch_or(CANCELED, Ordering::AcqRel) & CANCELED == 0
    }

    /// Leave `Created`, either for `Executing`, or for `Failed` when canceled.
    fn start(&self) -> Result<(), Error> {
        let created = CallState::Created.as_u8();
        let mut current = created;

        loop {
            if current & !CANCELED != created {
                return Err(Error::AlreadyExecuted);
            }

            // Canceled calls skip Executing entirely.
            let canceled = current & CANCELED != 0;
            let next = if canceled {
                CANCELED | CallState::Failed.as_u8()
            } else {
                CallState::Executing.as_u8()
            };

            match self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        debug!("{:?}", self);

        if current & CANCELED != 0 {
            return Err(Error::Canceled);
        }

        Ok(())
    }

    fn set_terminal(&self, to: CallState) {
        let executing = CallState::Executing.as_u8();

        // Only the executing side ends the call, so this can't race another end.
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                (w & !CANCELED == executing).then(|| (w & CANCELED) | to.as_u8())
            });

        *self.exchange.lock() = None;
        debug!("{:?}", self);
    }

    fn finish<T>(
        &self,
        outcome: std::io::Result<RawResponse>,
        converter: &dyn ResponseConverter<T>,
    ) -> Result<Response<T>, Error> {
        let result = match outcome {
            Ok(raw) => to_response(raw, converter),
            Err(_) if self.is_canceled() => Err(Error::Canceled),
            Err(e) => Err(Error::Io(e)),
        };

        let end = if result.is_ok() {
            CallState::Completed
        } else {
            CallState::Failed
        };
        self.set_terminal(end);

        result
    }
}

impl<T, B> Clone for Call<T, B> {
    /// Create a new, identical call which can be executed even if this one
    /// already has been.
    ///
    /// The clone shares the request, but starts out in
    /// [`CallState::Created`] and not canceled.
    fn clone(&self) -> Self {
        Call::from_parts(
            self.request.clone(),
            self.transport.clone(),
            self.converter.clone(),
        )
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.state.load(Ordering::Acquire);
        let state = CallState::from_u8(word & !CANCELED);

        if word & CANCELED != 0 {
            write!(f, "Call<{:?}, canceled>", state)
        } else {
            write!(f, "Call<{:?}>", state)
        }
    }
}

impl<T, B> fmt::Debug for Call<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.shared, f)
    }
}
