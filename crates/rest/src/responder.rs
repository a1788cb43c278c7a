//! Turns handler outcomes into HTTP responses.
//!
//! Errors are answered with their message as a plain text body. The status comes
//! from [`HttpError`] when the error is one, and is `500` otherwise.

use crate::{BoxError, HttpError, Payload, ResponseBody};
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderValue, Response, StatusCode};
use micro_codec::{Codec, CodecExt};
use std::any::Any;
use std::error::Error;
use tracing::{debug, error};

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Encodes `payload` with `codec` into a `200 OK` response.
pub(crate) fn payload_response(codec: &dyn Codec, payload: &Payload) -> Result<Response<ResponseBody>, BoxError> {
    let bytes = codec.encode_bytes(payload)?;
    let mut response = Response::new(ResponseBody::once(bytes));
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_str(codec.mime_type())?);
    Ok(response)
}

/// Builds the response for an error returned by a handler.
pub fn error_response(error: &(dyn Error + Send + Sync + 'static)) -> Response<ResponseBody> {
    match error.downcast_ref::<HttpError>() {
        Some(http_error) => text_response(http_error.status(), http_error.message().to_owned()),
        None => text_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

/// Builds the response for a panic caught while handling a request.
///
/// A panic raised with an [`HttpError`] payload keeps its status, anything else
/// is a `500` whose details are only logged.
pub fn panic_response(panic: Box<dyn Any + Send>) -> Response<ResponseBody> {
    match panic.downcast::<HttpError>() {
        Ok(http_error) => text_response(http_error.status(), http_error.message().to_owned()),
        Err(panic) => {
            error!(panic = %panic_message(panic.as_ref()), "handler panicked");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_owned())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

pub(crate) fn text_response(status: StatusCode, message: String) -> Response<ResponseBody> {
    if status.is_server_error() {
        error!(status = status.as_u16(), reason = %message, "request failed");
    } else {
        debug!(status = status.as_u16(), reason = %message, "request rejected");
    }

    let mut response = Response::new(ResponseBody::from(message));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    if let Ok(content_type) = HeaderValue::from_str(mime::TEXT_PLAIN_UTF_8.as_ref()) {
        headers.insert(CONTENT_TYPE, content_type);
    }
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
