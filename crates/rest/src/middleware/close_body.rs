use crate::middleware::Middleware;
use crate::{BoxHandler, HandlerResult, RequestContext, RequestHandler};
use async_trait::async_trait;

/// Releases the request body once the inner handlers are done, read or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseBody;

impl Middleware for CloseBody {
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        Box::new(CloseBodyHandler { next })
    }
}

struct CloseBodyHandler {
    next: BoxHandler,
}

#[async_trait]
impl RequestHandler for CloseBodyHandler {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        let result = self.next.invoke(req).await;
        req.body().close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::CloseBody;
    use crate::middleware::Chain;
    use crate::middleware::tests::Action;
    use crate::{OptionReqBody, RequestContext, RequestHandler};
    use bytes::Bytes;
    use http::Request;
    use http_body_util::Full;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn body_is_closed_even_when_unread() {
        let (parts, body) = Request::post("/users").body(Full::new(Bytes::from_static(b"{}"))).unwrap().into_parts();
        let mut req = RequestContext::new(parts, OptionReqBody::new(body), vec![]);
        assert!(req.body().can_consume().await);

        Chain::new().with(CloseBody).then(Action).invoke(&mut req).await.unwrap();
        assert!(!req.body().can_consume().await);
    }
}
