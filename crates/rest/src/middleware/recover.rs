use crate::middleware::Middleware;
use crate::responder::{error_response, panic_response};
use crate::{BoxHandler, HandlerResult, RequestContext, RequestHandler};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Answers errors and panics of the inner handlers.
///
/// After this step a request always has a response: errors are mapped by
/// [`error_response`] and panics by [`panic_response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

impl Middleware for Recover {
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        Box::new(RecoverHandler { next })
    }
}

struct RecoverHandler {
    next: BoxHandler,
}

#[async_trait]
impl RequestHandler for RecoverHandler {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        match AssertUnwindSafe(self.next.invoke(req)).catch_unwind().await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Ok(error_response(e.as_ref())),
            Err(panic) => Ok(panic_response(panic)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Recover;
    use crate::middleware::Chain;
    use crate::middleware::tests::context;
    use crate::{HandlerResult, HttpError, RequestContext, RequestHandler};
    use async_trait::async_trait;
    use http::{Method, StatusCode};

    struct Failing;

    #[async_trait]
    impl RequestHandler for Failing {
        async fn invoke(&self, _req: &mut RequestContext) -> HandlerResult {
            Err(HttpError::bad_request("nope").into())
        }
    }

    struct Panicking;

    #[async_trait]
    impl RequestHandler for Panicking {
        async fn invoke(&self, _req: &mut RequestContext) -> HandlerResult {
            panic!("boom")
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn errors_become_responses() {
        let handler = Chain::new().with(Recover).then(Failing);
        let response = handler.invoke(&mut context(Method::GET, "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn panics_become_internal_errors() {
        let handler = Chain::new().with(Recover).then(Panicking);
        let response = handler.invoke(&mut context(Method::GET, "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
