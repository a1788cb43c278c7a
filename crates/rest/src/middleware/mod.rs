//! Request transforming steps wrapped around an action.
//!
//! A [`Middleware`] decorates the next [`RequestHandler`](crate::RequestHandler)
//! with a new one. A [`Chain`] applies several of them in order: the first
//! middleware becomes the outermost handler and the last one sits right around
//! the action.
//!
//! The router builds every capability route as
//! `Recover -> Negotiate -> ExtractParams -> CloseBody -> resource chain -> action`,
//! where `CloseBody` is only used by methods that carry a body.

mod close_body;
mod negotiate;
mod params;
mod recover;

pub use close_body::CloseBody;
pub use negotiate::Negotiate;
pub use params::ExtractParams;
pub use recover::Recover;

use crate::{BoxHandler, RequestHandler};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Wraps a handler into another one.
pub trait Middleware: Send + Sync {
    fn decorate(&self, next: BoxHandler) -> BoxHandler;
}

/// A middleware made of a closure.
#[derive(Clone, Copy)]
pub struct MiddlewareFn<F> {
    f: F,
}

/// Creates a middleware from a closure.
///
/// # Example
/// ```
/// use micro_rest::BoxHandler;
/// use micro_rest::middleware::{Chain, middleware_fn};
///
/// let identity = middleware_fn(|next: BoxHandler| next);
/// let chain = Chain::new().with(identity);
/// assert_eq!(chain.len(), 1);
/// ```
pub fn middleware_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync,
{
    MiddlewareFn { f }
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync,
{
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        (self.f)(next)
    }
}

impl<F> fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn").finish_non_exhaustive()
    }
}

/// An ordered sequence of middleware. An empty chain changes nothing.
#[derive(Clone, Default)]
pub struct Chain {
    items: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware`, it will run inside the ones already in the chain.
    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    pub fn push<M: Middleware + 'static>(&mut self, middleware: M) {
        self.items.push(Arc::new(middleware));
    }

    /// Appends every middleware of `other`, keeping its order.
    pub fn extend(&mut self, other: Chain) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wraps `handler` with the whole chain.
    pub fn then<H: RequestHandler + 'static>(&self, handler: H) -> BoxHandler {
        self.decorate(Box::new(handler))
    }
}

impl Middleware for Chain {
    fn decorate(&self, next: BoxHandler) -> BoxHandler {
        self.items.iter().rev().fold(next, |handler, middleware| middleware.decorate(handler))
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.items.len()).finish()
    }
}

/// Per method middleware chains of one resource.
///
/// Resources embed a set and return [`MiddlewareSet::chain_for`] from
/// [`Resource::middleware`](crate::Resource::middleware).
#[derive(Default)]
pub struct MiddlewareSet {
    chains: RwLock<HashMap<Method, Chain>>,
}

impl MiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chain` to the chain of `method`, creating it on first use.
    pub fn use_for(&self, method: Method, chain: Chain) {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        chains.entry(method).or_default().extend(chain);
    }

    /// The chain of `method`, empty when nothing was registered for it.
    pub fn chain_for(&self, method: &Method) -> Chain {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        chains.get(method).cloned().unwrap_or_default()
    }
}

impl fmt::Debug for MiddlewareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_map().entries(chains.iter()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Chain, Middleware, MiddlewareSet, middleware_fn};
    use crate::{BoxHandler, HandlerResult, OptionReqBody, RequestContext, RequestHandler, ResponseBody};
    use async_trait::async_trait;
    use http::{HeaderValue, Method, Request, Response};

    /// Appends its tag to the `x-trace` header of the response.
    pub(crate) struct Tag(pub(crate) &'static str);

    struct TagHandler {
        tag: &'static str,
        next: BoxHandler,
    }

    impl Middleware for Tag {
        fn decorate(&self, next: BoxHandler) -> BoxHandler {
            Box::new(TagHandler { tag: self.0, next })
        }
    }

    #[async_trait]
    impl RequestHandler for TagHandler {
        async fn invoke(&self, req: &mut RequestContext) -> HandlerResult {
            let mut response = self.next.invoke(req).await?;
            let trace = match response.headers().get("x-trace") {
                Some(value) => format!("{} {}", value.to_str()?, self.tag),
                None => self.tag.to_owned(),
            };
            response.headers_mut().insert("x-trace", HeaderValue::from_str(&trace)?);
            Ok(response)
        }
    }

    pub(crate) struct Action;

    #[async_trait]
    impl RequestHandler for Action {
        async fn invoke(&self, _req: &mut RequestContext) -> HandlerResult {
            Ok(Response::new(ResponseBody::empty()))
        }
    }

    pub(crate) fn context(method: Method, uri: &str) -> RequestContext {
        let (parts, ()) = Request::builder().method(method).uri(uri).body(()).unwrap().into_parts();
        RequestContext::new(parts, OptionReqBody::empty(), vec![])
    }

    async fn trace_of(chain: &Chain) -> String {
        let handler = chain.then(Action);
        let response = handler.invoke(&mut context(Method::GET, "/")).await.unwrap();
        response.headers().get("x-trace").map(|value| value.to_str().unwrap().to_owned()).unwrap_or_default()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn first_middleware_is_outermost() {
        let chain = Chain::new().with(Tag("outer")).with(Tag("middle")).with(Tag("inner"));
        // responses travel outwards, so the innermost tag is written first
        assert_eq!(trace_of(&chain).await, "inner middle outer");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn empty_chain_is_a_no_op() {
        assert!(Chain::new().is_empty());
        assert_eq!(trace_of(&Chain::new()).await, "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn nested_chain_keeps_order() {
        let mut chain = Chain::new().with(Tag("default"));
        chain.extend(Chain::new().with(Tag("custom")));
        chain.push(middleware_fn(|next: BoxHandler| next));
        assert_eq!(chain.len(), 3);
        assert_eq!(trace_of(&chain).await, "custom default");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn use_for_appends_per_method() {
        let set = MiddlewareSet::new();
        set.use_for(Method::GET, Chain::new().with(Tag("a")));
        set.use_for(Method::GET, Chain::new().with(Tag("b")));
        set.use_for(Method::POST, Chain::new().with(Tag("c")));

        assert_eq!(trace_of(&set.chain_for(&Method::GET)).await, "b a");
        assert_eq!(trace_of(&set.chain_for(&Method::POST)).await, "c");
        assert!(set.chain_for(&Method::DELETE).is_empty());
    }
}
