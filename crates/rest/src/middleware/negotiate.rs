use crate::middleware::Middleware;
use crate::{BoxHandler, HandlerResult, HttpError, RequestContext, RequestHandler};
use async_trait::async_trait;
use http::HeaderName;
use http::header::{ACCEPT, CONTENT_TYPE};
use micro_codec::{Codec, CodecRegistry};
use std::sync::Arc;
use tracing::trace;

/// Selects the request and response codecs.
///
/// The request codec is resolved from `Content-Type` and the response codec from
/// `Accept`, a missing header selects the default codec. The whole `Accept` value
/// is tried first, then each of its comma separated entries in order. A header no
/// codec resolves for is rejected with `400 Bad Request` before the body is read.
#[derive(Debug, Clone)]
pub struct Negotiate {
    codecs: Arc<CodecRegistry>,
}

impl Negotiate {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self { codecs }
    }
}

impl Middleware for Negotiate {
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        Box::new(NegotiateHandler { codecs: Arc::clone(&self.codecs), next })
    }
}

struct NegotiateHandler {
    codecs: Arc<CodecRegistry>,
    next: BoxHandler,
}

impl NegotiateHandler {
    fn request_codec(&self, req: &RequestContext) -> Result<Arc<dyn Codec>, HttpError> {
        let content_type = header_str(req, CONTENT_TYPE)?;
        self.codecs.resolve(content_type).ok_or_else(|| unsupported(content_type))
    }

    fn response_codec(&self, req: &RequestContext) -> Result<Arc<dyn Codec>, HttpError> {
        let accept = header_str(req, ACCEPT)?;
        if let Some(codec) = self.codecs.resolve(accept) {
            return Ok(codec);
        }

        accept
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| self.resolve_media_range(candidate))
            .ok_or_else(|| unsupported(accept))
    }

    /// Resolves one `Accept` entry, then its bare media type, so
    /// `*/*;q=0.8` reaches the default codec.
    fn resolve_media_range(&self, range: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.resolve(range).or_else(|| {
            let (media_type, _params) = range.split_once(';')?;
            self.codecs.resolve(media_type.trim_end())
        })
    }
}

#[async_trait]
impl RequestHandler for NegotiateHandler {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        let request_codec = self.request_codec(req)?;
        let response_codec = self.response_codec(req)?;
        trace!(request = request_codec.mime_type(), response = response_codec.mime_type(), "negotiated codecs");

        req.set_codecs(request_codec, response_codec);
        self.next.invoke(req).await
    }
}

fn header_str(req: &RequestContext, name: HeaderName) -> Result<&str, HttpError> {
    match req.headers().get(&name) {
        Some(value) => value.to_str().map_err(|e| HttpError::bad_request(format!("invalid {name} header: {e}"))),
        None => Ok(""),
    }
}

fn unsupported(mime: &str) -> HttpError {
    HttpError::bad_request(format!("unsupported codec: {mime:?}"))
}

#[cfg(test)]
mod tests {
    use super::Negotiate;
    use crate::middleware::{Chain, Recover};
    use crate::{HandlerResult, OptionReqBody, RequestContext, RequestHandler, ResponseBody};
    use async_trait::async_trait;
    use http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use micro_codec::{FORM_MIME_TYPE, JSON_MIME_TYPE, default_registry};
    use std::sync::Arc;

    /// Answers with the negotiated mime types as `request response`.
    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
            let request = req.request_codec().map(|codec| codec.mime_type().to_owned()).unwrap_or_default();
            let response = req.response_codec().map(|codec| codec.mime_type().to_owned()).unwrap_or_default();
            Ok(Response::new(ResponseBody::from(format!("{request} {response}"))))
        }
    }

    async fn negotiate(headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut builder = Request::post("/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        let mut req = RequestContext::new(parts, OptionReqBody::empty(), vec![]);

        let handler = Chain::new().with(Recover).with(Negotiate::new(Arc::new(default_registry()))).then(Echo);
        let response = handler.invoke(&mut req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn missing_headers_select_default() {
        let expected = format!("{JSON_MIME_TYPE} {JSON_MIME_TYPE}");
        assert_eq!(negotiate(&[]).await, (StatusCode::OK, expected));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_type_and_accept_are_independent() {
        let headers = [("content-type", "application/x-www-form-urlencoded"), ("accept", "application/json")];
        assert_eq!(negotiate(&headers).await, (StatusCode::OK, format!("{FORM_MIME_TYPE} {JSON_MIME_TYPE}")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn parameters_resolve_by_submatch() {
        let headers = [("content-type", "application/json; charset=utf-8"), ("accept", "*/*")];
        assert_eq!(negotiate(&headers).await, (StatusCode::OK, format!("{JSON_MIME_TYPE} {JSON_MIME_TYPE}")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn accept_list_falls_back_to_entries() {
        let headers = [("accept", "text/html, application/x-www-form-urlencoded, application/json")];
        assert_eq!(negotiate(&headers).await, (StatusCode::OK, format!("{JSON_MIME_TYPE} {FORM_MIME_TYPE}")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn weighted_wildcard_selects_default() {
        let headers = [("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")];
        assert_eq!(negotiate(&headers).await, (StatusCode::OK, format!("{JSON_MIME_TYPE} {JSON_MIME_TYPE}")));

        let headers = [("accept", "application/x-www-form-urlencoded ; q=0.5")];
        assert_eq!(negotiate(&headers).await, (StatusCode::OK, format!("{JSON_MIME_TYPE} {FORM_MIME_TYPE}")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn unknown_content_type_is_rejected() {
        let headers = [("content-type", "application/javascript")];
        assert_eq!(
            negotiate(&headers).await,
            (StatusCode::BAD_REQUEST, r#"unsupported codec: "application/javascript""#.to_owned())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn unknown_accept_is_rejected() {
        let headers = [("accept", "text/html")];
        assert_eq!(
            negotiate(&headers).await,
            (StatusCode::BAD_REQUEST, r#"unsupported codec: "text/html""#.to_owned())
        );
    }
}
