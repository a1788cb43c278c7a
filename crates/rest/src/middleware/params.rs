use crate::middleware::Middleware;
use crate::{BoxHandler, HandlerResult, PathParams, RequestContext, RequestHandler};
use async_trait::async_trait;

/// Copies the variables matched by the router into the request [`PathParams`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractParams;

impl Middleware for ExtractParams {
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        Box::new(ExtractParamsHandler { next })
    }
}

struct ExtractParamsHandler {
    next: BoxHandler,
}

#[async_trait]
impl RequestHandler for ExtractParamsHandler {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        let params: PathParams = req.route_vars().iter().cloned().collect();
        req.set_path_params(params);
        self.next.invoke(req).await
    }
}
