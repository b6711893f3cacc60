//! Single-use, cancelable HTTP call handle.
//!
//! A [`Call`] wraps one finalized [`http::Request`] and sends it exactly once,
//! either blocking with [`Call::execute`] or non-blocking with
//! [`Call::enqueue`]. The call can be canceled at any time from any thread,
//! and cloned into a fresh call with the same request to retry or poll.
//!
//! The crate does no I/O of its own. Sending is delegated to a [`Transport`],
//! which hands out one [`Exchange`] per call. Turning the body of a successful
//! response into something typed is done by a [`ResponseConverter`].
//!
//! # Example
//!
//! ```
//! use std::io;
//! use std::sync::Arc;
//!
//! use ureq_call::http::{Request, Response};
//! use ureq_call::{BoxError, Call, Completion, Exchange, RawResponse, Transport, Utf8Body};
//!
//! // A transport that always answers "hello".
//! struct Canned;
//! struct CannedExchange;
//!
//! impl Transport<()> for Canned {
//!     fn new_exchange(&self, _: Arc<Request<()>>) -> Result<Arc<dyn Exchange>, BoxError> {
//!         Ok(Arc::new(CannedExchange))
//!     }
//! }
//!
//! impl Exchange for CannedExchange {
//!     fn execute(&self) -> io::Result<RawResponse> {
//!         Ok(Response::builder().status(200).body(b"hello".to_vec()).unwrap())
//!     }
//!     fn enqueue(&self, completion: Completion) {
//!         completion.complete(self.execute());
//!     }
//!     fn abort(&self) {}
//! }
//!
//! let request = Request::get("https://example.test/greeting").body(()).unwrap();
//! let call: Call<String> = Call::new(request, Arc::new(Canned), Arc::new(Utf8Body));
//!
//! let response = call.execute().unwrap();
//! assert_eq!(response.body().map(String::as_str), Some("hello"));
//!
//! // Single use.
//! assert!(call.is_executed());
//! assert!(call.execute().is_err());
//!
//! // A clone is a new call with the same request.
//! let retry = call.clone();
//! assert!(!retry.is_executed());
//! assert!(retry.execute().is_ok());
//! ```
//!
//! # In scope:
//!
//! * Single-use guard for execute/enqueue
//! * Cancellation, before and during execution
//! * Exactly once delivery of the enqueue outcome
//! * Status handling of the response (success body vs error body)
//!
//! # Out of scope:
//!
//! * Opening/closing sockets, TLS, pooling, timeouts
//! * Building requests
//! * Retries and interceptors
//! * Concrete body codecs beyond raw bytes and UTF-8
//!
//! # The http crate
//!
//! Based on the [http crate](https://crates.io/crates/http) - a unified HTTP API for Rust.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod call;
mod convert;
mod error;
mod factory;
mod response;
mod transport;

pub use call::{Call, CallState};
pub use convert::{RawBody, ResponseConverter, Utf8Body};
pub use error::{BoxError, Error, ErrorKind};
pub use factory::CallFactory;
pub use response::Response;
pub use transport::{Completion, Exchange, RawResponse, Transport};

pub use http;
