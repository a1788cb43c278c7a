//! The innermost handlers of generated routes.

use crate::responder::payload_response;
use crate::{
    BoxError, Capability, Decode, HandlerResult, HttpError, Methods, Payload, RequestContext, RequestHandler, Resource,
    ResponseBody,
};
use async_trait::async_trait;
use http::header::ACCESS_CONTROL_ALLOW_METHODS;
use http::{HeaderValue, Response};
use std::sync::Arc;

/// Calls one capability of a resource and encodes its result.
pub(crate) struct ActionHandler {
    resource: Arc<dyn Resource>,
    capability: Capability,
}

impl ActionHandler {
    pub(crate) fn new(resource: Arc<dyn Resource>, capability: Capability) -> Self {
        Self { resource, capability }
    }

    async fn dispatch(&self, ctx: &RequestContext) -> Result<Payload, BoxError> {
        let resource = self.resource.as_ref();
        let missing = || HttpError::internal(format!("resource does not implement {}", self.capability.name()));

        match self.capability {
            Capability::PluralGetter => {
                let params = ctx.query()?;
                resource.as_plural_getter().ok_or_else(missing)?.get_all(ctx, &params).await
            }
            Capability::SingleGetter => resource.as_single_getter().ok_or_else(missing)?.get(ctx, pk(ctx)).await,
            Capability::PluralPoster => {
                resource.as_plural_poster().ok_or_else(missing)?.post_all(ctx, Decode::new(ctx)).await
            }
            Capability::SinglePoster => {
                resource.as_single_poster().ok_or_else(missing)?.post(ctx, Decode::new(ctx)).await
            }
            Capability::PluralPatcher => {
                let params = ctx.query()?;
                resource.as_plural_patcher().ok_or_else(missing)?.patch_all(ctx, &params, Decode::new(ctx)).await
            }
            Capability::SinglePatcher => {
                resource.as_single_patcher().ok_or_else(missing)?.patch(ctx, pk(ctx), Decode::new(ctx)).await
            }
            Capability::PluralPutter => {
                let params = ctx.query()?;
                resource.as_plural_putter().ok_or_else(missing)?.put_all(ctx, &params, Decode::new(ctx)).await
            }
            Capability::SinglePutter => {
                resource.as_single_putter().ok_or_else(missing)?.put(ctx, pk(ctx), Decode::new(ctx)).await
            }
            Capability::PluralDeleter => {
                let params = ctx.query()?;
                resource.as_plural_deleter().ok_or_else(missing)?.delete_all(ctx, &params).await
            }
            Capability::SingleDeleter => resource.as_single_deleter().ok_or_else(missing)?.delete(ctx, pk(ctx)).await,
        }
    }
}

fn pk(ctx: &RequestContext) -> &str {
    ctx.path_params().pk().unwrap_or_default()
}

#[async_trait]
impl RequestHandler for ActionHandler {
    async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
        let payload = self.dispatch(req).await?;
        let codec = req.response_codec().ok_or_else(|| HttpError::internal("response codec has not been negotiated"))?;
        payload_response(codec.as_ref(), &payload)
    }
}

/// Answers `OPTIONS` with the methods registered on a path.
pub(crate) struct OptionsHandler {
    allowed: HeaderValue,
}

impl OptionsHandler {
    pub(crate) fn new(methods: &Methods) -> Result<Self, http::header::InvalidHeaderValue> {
        Ok(Self { allowed: HeaderValue::from_str(&methods.join())? })
    }
}

#[async_trait]
impl RequestHandler for OptionsHandler {
    async fn invoke(&self, _req: &mut RequestContext) -> HandlerResult {
        let mut response = Response::new(ResponseBody::empty());
        response.headers_mut().insert(ACCESS_CONTROL_ALLOW_METHODS, self.allowed.clone());
        Ok(response)
    }
}
