use http::StatusCode;

use crate::transport::RawResponse;
use crate::{BoxError, Error, Response};

/// Turns the raw body of a successful response into `T`.
///
/// Any error returned is a data error and surfaces as
/// [`Error::Unexpected`]. Closures of the right shape implement this trait.
pub trait ResponseConverter<T>: Send + Sync {
    /// Convert the body bytes.
    fn convert(&self, body: Vec<u8>) -> Result<T, BoxError>;
}

impl<T, F> ResponseConverter<T> for F
where
    F: Fn(Vec<u8>) -> Result<T, BoxError> + Send + Sync,
{
    fn convert(&self, body: Vec<u8>) -> Result<T, BoxError> {
        (self)(body)
    }
}

/// Passes the body bytes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBody;

impl ResponseConverter<Vec<u8>> for RawBody {
    fn convert(&self, body: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        Ok(body)
    }
}

/// Reads the body as a UTF-8 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Body;

impl ResponseConverter<String> for Utf8Body {
    fn convert(&self, body: Vec<u8>) -> Result<String, BoxError> {
        Ok(String::from_utf8(body)?)
    }
}

pub(crate) fn to_response<T>(
    raw: RawResponse,
    converter: &dyn ResponseConverter<T>,
) -> Result<Response<T>, Error> {
    let (parts, body) = raw.into_parts();
    let head = http::Response::from_parts(parts, ());
    let status = head.status();

    if !status.is_success() {
        trace!("Not converting body for status: {}", status);
        return Ok(Response::error(head, body));
    }

    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        trace!("No body for status: {}", status);
        return Ok(Response::success(head, None));
    }

    let converted = converter.convert(body).map_err(Error::Unexpected)?;

    Ok(Response::success(head, Some(converted)))
}
