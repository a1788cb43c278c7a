use crate::{BoxError, HttpError};
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::Mutex;

pub type ReqBody = UnsyncBoxBody<Bytes, BoxError>;

/// A request body that can be consumed at most once.
///
/// It is shared by reference along the middleware chain, the first reader takes
/// it and later readers get an error.
pub struct OptionReqBody {
    inner: Mutex<Option<ReqBody>>,
}

impl OptionReqBody {
    pub fn new<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self { inner: Mutex::new(Some(body.map_err(Into::<BoxError>::into).boxed_unsync())) }
    }

    pub fn empty() -> Self {
        Self::new(Empty::<Bytes>::new())
    }

    pub async fn can_consume(&self) -> bool {
        let guard = self.inner.lock().await;
        guard.is_some()
    }

    /// Reads the whole body into memory.
    pub async fn take_bytes(&self) -> Result<Bytes, HttpError> {
        let body = self.inner.lock().await.take().ok_or_else(|| HttpError::internal("request body has been consumed"))?;

        body.collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| HttpError::bad_request(format!("unable to read request body: {e}")))
    }

    /// Releases the body, whatever has not been read is dropped.
    pub async fn close(&self) {
        drop(self.inner.lock().await.take());
    }
}

impl fmt::Debug for OptionReqBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionReqBody").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ResponseBody {
    inner: Option<Bytes>,
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Some(bytes) } }
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<Bytes> for ResponseBody {
    fn from(value: Bytes) -> Self {
        Self::once(value)
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().inner.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            None => SizeHint::with_exact(0),
            Some(bytes) => SizeHint::with_exact(bytes.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionReqBody, ResponseBody};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body::Body as HttpBody;
    use http_body_util::{BodyExt, Full};

    fn check_send_sync<T: Send + Sync>() {}

    #[test]
    fn is_send_sync() {
        check_send_sync::<ResponseBody>();
        check_send_sync::<OptionReqBody>();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_string_body() {
        let s = "Hello world".to_string();
        let len = s.len() as u64;

        let mut body = ResponseBody::from(s);

        assert_eq!(body.size_hint().exact(), Some(len));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from("Hello world"));

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_empty_body() {
        let mut body = ResponseBody::from("");

        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));

        assert!(body.frame().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn request_body_is_consumed_once() {
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"{\"foo\":\"bar\"}")));
        assert!(body.can_consume().await);

        let bytes = body.take_bytes().await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"{\"foo\":\"bar\"}"));
        assert!(!body.can_consume().await);

        let error = body.take_bytes().await.unwrap_err();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn closed_body_can_not_be_read() {
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"ignored")));
        body.close().await;
        assert!(!body.can_consume().await);
        assert!(body.take_bytes().await.is_err());
    }
}
