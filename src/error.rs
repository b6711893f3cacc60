use std::fmt;
use std::io;

/// Boxed error used at the collaborator seams (transport and converter).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for ureq-call
///
/// The variants fall into three [kinds](ErrorKind). Callers deciding whether
/// to retry (via [`Call::clone`](crate::Call)) should look at [`Error::kind`]
/// rather than matching variants.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The transport failed talking to the server.
    ///
    /// Connection refused, reset, timeout, TLS failure etc.
    Io(io::Error),

    /// The call was canceled via [`Call::cancel`](crate::Call::cancel).
    ///
    /// This is an I/O kind of error, but kept apart so callers can tell
    /// "canceled" from "network failed".
    Canceled,

    /// A defect creating the request or decoding the response.
    ///
    /// This is a programming or data error, not a network condition.
    Unexpected(BoxError),

    /// The call was already executed or enqueued.
    AlreadyExecuted,
}

/// The broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport level failure, including cancellation. Retryable with a clone.
    Io,
    /// Request construction or response decoding defect. Not retryable.
    Unexpected,
    /// Misuse of the call handle.
    IllegalState,
}

impl Error {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Canceled => ErrorKind::Io,
            Error::Unexpected(_) => ErrorKind::Unexpected,
            Error::AlreadyExecuted => ErrorKind::IllegalState,
        }
    }

    /// Whether this error is the result of canceling the call.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }

    /// Whether this is an I/O kind of error (which includes cancellation).
    pub fn is_io(&self) -> bool {
        self.kind() == ErrorKind::Io
    }

    pub(crate) fn unexpected(e: impl Into<BoxError>) -> Self {
        Error::Unexpected(e.into())
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Unexpected(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io: {}", e),
            Error::Canceled => write!(f, "canceled"),
            Error::Unexpected(e) => write!(f, "unexpected: {}", e),
            Error::AlreadyExecuted => write!(f, "already executed"),
        }
    }
}
