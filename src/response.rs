use std::fmt;

use http::{HeaderMap, StatusCode, Version};

/// The response of a [`Call`](crate::Call).
///
/// A 2xx response carries the converted body (absent for `204` and `205`).
/// Any other status carries the raw, unconverted error body.
pub struct Response<T> {
    head: http::Response<()>,
    body: Option<T>,
    error_body: Option<Vec<u8>>,
}

impl<T> Response<T> {
    pub(crate) fn success(head: http::Response<()>, body: Option<T>) -> Self {
        debug_assert!(head.status().is_success());
        Response {
            head,
            body,
            error_body: None,
        }
    }

    pub(crate) fn error(head: http::Response<()>, error_body: Vec<u8>) -> Self {
        debug_assert!(!head.status().is_success());
        Response {
            head,
            body: None,
            error_body: Some(error_body),
        }
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    /// The HTTP version of the response.
    pub fn version(&self) -> Version {
        self.head.version()
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// The response without body.
    pub fn head(&self) -> &http::Response<()> {
        &self.head
    }

    /// True if the status is in the range 200..300.
    pub fn is_success(&self) -> bool {
        self.head.status().is_success()
    }

    /// The converted body of a successful response.
    pub fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    /// Consume the response and take out the converted body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// The raw body of an unsuccessful response.
    pub fn error_body(&self) -> Option<&[u8]> {
        self.error_body.as_deref()
    }
}

impl<T> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.head.status())
            .field("version", &self.head.version())
            .field("body", &self.body.is_some())
            .field("error_body", &self.error_body.as_ref().map(|b| b.len()))
            .finish()
    }
}
