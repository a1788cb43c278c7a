use crate::{BoxError, RequestContext, ResponseBody};
use async_trait::async_trait;
use http::Response;

pub type HandlerResult = Result<Response<ResponseBody>, BoxError>;

pub type BoxHandler = Box<dyn RequestHandler>;

/// One step of request handling: a middleware wrapping another handler, or the final action.
///
/// Errors are returned, never written: the outermost
/// [`Recover`](crate::middleware::Recover) step turns them into responses.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        (**self).invoke(req).await
    }
}
