//! Per request state threaded through the middleware chain.
//!
//! - `RequestContext`: the request head, route variables, negotiated codecs and body
//! - `PathParams`: named segments extracted from the request path
//! - `QueryParams`: the decoded URI query
//! - `Decode`: decodes the request body with the negotiated request codec

use crate::{HttpError, OptionReqBody, Payload};
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};
use micro_codec::{Codec, CodecExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a handler may need to know about the request being served.
///
/// The context is created by the router for every matched request and owned by
/// that request only.
pub struct RequestContext {
    head: Parts,
    route_vars: Vec<(String, String)>,
    path_params: PathParams,
    request_codec: Option<Arc<dyn Codec>>,
    response_codec: Option<Arc<dyn Codec>>,
    body: OptionReqBody,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context for a request the router matched with `route_vars`.
    ///
    /// A [`CancellationToken`] found in the request extensions is inherited, so an
    /// engine can signal client disconnects to the resources.
    pub fn new(head: Parts, body: OptionReqBody, route_vars: Vec<(String, String)>) -> Self {
        let cancellation = head
            .extensions
            .get::<CancellationToken>()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        Self {
            head,
            route_vars,
            path_params: PathParams::empty(),
            request_codec: None,
            response_codec: None,
            body,
            cancellation,
        }
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.head.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.head.extensions
    }

    /// Route variables as matched by the router, before extraction.
    pub fn route_vars(&self) -> &[(String, String)] {
        &self.route_vars
    }

    /// Path parameters, filled by the [`ExtractParams`](crate::middleware::ExtractParams) step.
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn set_path_params(&mut self, path_params: PathParams) {
        self.path_params = path_params;
    }

    /// Decodes the URI query.
    pub fn query(&self) -> Result<QueryParams, HttpError> {
        QueryParams::parse(self.head.uri.query())
    }

    /// The codec chosen from the `Content-Type` header.
    pub fn request_codec(&self) -> Option<&Arc<dyn Codec>> {
        self.request_codec.as_ref()
    }

    /// The codec chosen from the `Accept` header.
    pub fn response_codec(&self) -> Option<&Arc<dyn Codec>> {
        self.response_codec.as_ref()
    }

    pub fn set_codecs(&mut self, request_codec: Arc<dyn Codec>, response_codec: Arc<dyn Codec>) {
        self.request_codec = Some(request_codec);
        self.response_codec = Some(response_codec);
    }

    pub fn body(&self) -> &OptionReqBody {
        &self.body
    }

    /// Cancelled when the request completes or is abandoned.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("path_params", &self.path_params)
            .field("request_codec", &self.request_codec.as_ref().map(|codec| codec.mime_type().to_owned()))
            .field("response_codec", &self.response_codec.as_ref().map(|codec| codec.mime_type().to_owned()))
            .finish_non_exhaustive()
    }
}

/// Named segments of the request path, for example `pk` in `/users/{pk}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.params.get(key.as_ref()).map(String::as_str)
    }

    /// The primary key segment of a single resource path.
    #[inline]
    pub fn pk(&self) -> Option<&str> {
        self.get("pk")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// The URI query as a multimap, keys are kept sorted.
///
/// Serializes as a map of lists, `?foo=bar&foo=baz` becomes `{"foo":["bar","baz"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Result<Self, HttpError> {
        let Some(query) = query else {
            return Ok(Self::default());
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| HttpError::bad_request(format!("invalid query string: {e}")))?;

        let mut values = BTreeMap::<String, Vec<String>>::new();
        for (key, value) in pairs {
            values.entry(key).or_default().push(value);
        }
        Ok(Self { values })
    }

    /// The first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// Decodes the request body with the negotiated request codec.
///
/// Handed to the capabilities that accept a body, so a resource decides what to
/// decode into without knowing the wire format. The body can be decoded once.
#[derive(Debug, Clone, Copy)]
pub struct Decode<'a> {
    ctx: &'a RequestContext,
}

impl<'a> Decode<'a> {
    pub fn new(ctx: &'a RequestContext) -> Self {
        Self { ctx }
    }

    /// Decodes the body into `T`.
    pub async fn decode<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let payload = self.payload().await?;
        serde_json::from_value(payload).map_err(|e| HttpError::bad_request(format!("invalid request body: {e}")))
    }

    /// Decodes the body without binding it to a type.
    pub async fn payload(&self) -> Result<Payload, HttpError> {
        let codec =
            self.ctx.request_codec().ok_or_else(|| HttpError::internal("request codec has not been negotiated"))?;
        let bytes = self.ctx.body().take_bytes().await?;
        codec.decode_bytes(bytes).map_err(|e| HttpError::bad_request(format!("unable to decode request body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{PathParams, QueryParams, RequestContext};
    use crate::OptionReqBody;
    use http::Request;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn query_is_a_multimap() {
        let query = QueryParams::parse(Some("foo=bar&foo=baz&name=hello%20world")).unwrap();
        assert_eq!(query.get("foo"), Some("bar"));
        assert_eq!(query.get_all("foo"), ["bar", "baz"]);
        assert_eq!(query.get("name"), Some("hello world"));
        assert!(query.get_all("missing").is_empty());
        assert_eq!(serde_json::to_string(&query).unwrap(), r#"{"foo":["bar","baz"],"name":["hello world"]}"#);
    }

    #[test]
    fn missing_query_is_empty() {
        let query = QueryParams::parse(None).unwrap();
        assert!(query.is_empty());
        assert_eq!(serde_json::to_string(&query).unwrap(), "{}");
    }

    #[test]
    fn path_params_from_pairs() {
        let params: PathParams = [("pk", "abcd")].into_iter().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params.pk(), Some("abcd"));
        assert_eq!(params.get("other"), None);
    }

    #[test]
    fn context_inherits_engine_cancellation() {
        let token = CancellationToken::new();
        let (parts, ()) =
            Request::builder().uri("/test/pass?foo=bar").extension(token.clone()).body(()).unwrap().into_parts();
        let ctx = RequestContext::new(parts, OptionReqBody::empty(), vec![]);

        assert!(!ctx.cancellation().is_cancelled());
        token.cancel();
        assert!(ctx.cancellation().is_cancelled());
        assert_eq!(ctx.query().unwrap().get("foo"), Some("bar"));
    }
}
