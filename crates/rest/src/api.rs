//! Route assembly and request dispatch.
//!
//! [`ApiBuilder::mount`] walks the resources of a [`Module`] and registers one
//! route per implemented capability, plus an `OPTIONS` route on every path that
//! received at least one of them. The resulting [`Api`] dispatches requests of
//! any `http` based engine.

use crate::action::{ActionHandler, OptionsHandler};
use crate::middleware::{Chain, CloseBody, ExtractParams, Negotiate, Recover};
use crate::responder::{error_response, text_response};
use crate::router::{RouteResult, Router, RouterBuilder};
use crate::{
    BoxError, Capability, ConfigError, Dependencies, Methods, Module, ModuleRegistry, OptionReqBody, PathShape,
    RequestContext, Resource, ResponseBody,
};
use bytes::Bytes;
use http::header::ALLOW;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body as HttpBody;
use micro_codec::CodecRegistry;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A route registered by mounting a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    method: Method,
    path: String,
}

impl RouteInfo {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.method, self.path)
    }
}

/// Dispatches requests to the routes generated from mounted modules.
pub struct Api {
    router: Router,
    routes: Vec<RouteInfo>,
}

impl Api {
    pub fn builder(codecs: Arc<CodecRegistry>) -> ApiBuilder {
        ApiBuilder::new(codecs)
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Handles one request.
    ///
    /// Never fails: errors are answered with their status, unknown paths with
    /// `404` and known paths without a handler for the method with `405`.
    pub async fn call<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();

        match self.router.at(&parts.method, parts.uri.path()) {
            RouteResult::Found { handler, route_vars } => {
                debug!(method = %parts.method, path = parts.uri.path(), "dispatching request");
                let mut ctx = RequestContext::new(parts, OptionReqBody::new(body), route_vars);
                let _cancel_on_drop = ctx.cancellation().clone().drop_guard();

                match handler.invoke(&mut ctx).await {
                    Ok(response) => response,
                    Err(e) => error_response(e.as_ref()),
                }
            }
            RouteResult::MethodNotAllowed { allowed } => {
                let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed".to_owned());
                if let Ok(value) = HeaderValue::from_str(&allowed.join()) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            RouteResult::NotFound => text_response(StatusCode::NOT_FOUND, "404 page not found".to_owned()),
        }
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api").field("routes", &self.routes).finish_non_exhaustive()
    }
}

/// Collects modules and dependencies before building an [`Api`].
pub struct ApiBuilder {
    codecs: Arc<CodecRegistry>,
    dependencies: Dependencies,
    aliases: BTreeSet<String>,
    router: RouterBuilder,
    routes: Vec<RouteInfo>,
}

impl ApiBuilder {
    fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            dependencies: Dependencies::new(),
            aliases: BTreeSet::new(),
            router: RouterBuilder::new(),
            routes: vec![],
        }
    }

    /// Makes `value` injectable into the resources mounted afterwards.
    pub fn provide<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.dependencies.provide(value);
        self
    }

    pub fn provide_shared<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.dependencies.provide_shared(value);
        self
    }

    /// Registers the routes of every resource of `module` under `alias`.
    ///
    /// Either every route of the module is registered or none is: an alias that
    /// is already mounted, a dependency that cannot be injected, a resource
    /// that fails to initialize or a path conflicting with a mounted one aborts
    /// the whole call.
    pub fn mount(&mut self, alias: impl Into<String>, module: &Module) -> Result<(), ConfigError> {
        let alias = alias.into();
        if self.aliases.contains(&alias) {
            return Err(ConfigError::AliasInUse(alias));
        }

        let mut staged = RouterBuilder::new();
        let mut routes = vec![];
        let mut result = Ok(());
        module.for_each(|name, resource| {
            match self.stage(&alias, name, resource, &mut staged, &mut routes) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    result = Err(e);
                    ControlFlow::Break(())
                }
            }
        });

        if let Err(e) = result.and_then(|()| self.router.merge(staged)) {
            error!(alias = %alias, error = %e, "unable to mount module");
            return Err(e);
        }

        for route in &routes {
            info!(method = %route.method, path = %route.path, "route registered");
        }
        self.routes.extend(routes);
        self.aliases.insert(alias);
        Ok(())
    }

    /// Mounts every module of `registry` under its registered alias, stopping at
    /// the first failure.
    pub fn mount_all(&mut self, registry: &ModuleRegistry) -> Result<(), ConfigError> {
        let mut result = Ok(());
        registry.for_each(|alias, module| match self.mount(alias, module) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                result = Err(e);
                ControlFlow::Break(())
            }
        });
        result
    }

    pub fn build(self) -> Result<Api, ConfigError> {
        Ok(Api { router: self.router.build()?, routes: self.routes })
    }

    fn stage(
        &self,
        alias: &str,
        name: &str,
        resource: &Arc<dyn Resource>,
        staged: &mut RouterBuilder,
        routes: &mut Vec<RouteInfo>,
    ) -> Result<(), ConfigError> {
        let label = format!("{alias}/{name}");
        resource
            .inject(&self.dependencies)
            .map_err(|source| ConfigError::Dependency { resource: label.clone(), source })?;
        resource.init().map_err(|source| ConfigError::Init { resource: label, source })?;

        let plural_path = join_path(&[alias, name]);
        let single_path = join_path(&[alias, name, "{pk}"]);
        let mut plural_methods = Methods::new();
        let mut single_methods = Methods::new();

        for capability in Capability::ALL {
            if !capability.is_implemented_by(resource.as_ref()) {
                continue;
            }

            let method = capability.method();
            let (path, methods) = match capability.shape() {
                PathShape::Plural => (&plural_path, &mut plural_methods),
                PathShape::Single => (&single_path, &mut single_methods),
            };
            let action = ActionHandler::new(Arc::clone(resource), capability);
            let handler = self.capability_chain(resource.as_ref(), capability).then(action);
            staged.route(path.as_str(), method.clone(), handler)?;
            routes.push(RouteInfo { method: method.clone(), path: path.clone() });
            methods.add(method);
        }

        for (path, methods) in [(plural_path, plural_methods), (single_path, single_methods)] {
            if methods.is_empty() {
                continue;
            }
            let handler = options_chain(resource.as_ref()).then(OptionsHandler::new(&methods)?);
            staged.route(path.as_str(), Method::OPTIONS, handler)?;
            routes.push(RouteInfo { method: Method::OPTIONS, path });
        }
        Ok(())
    }

    fn capability_chain(&self, resource: &dyn Resource, capability: Capability) -> Chain {
        let mut chain = Chain::new().with(Recover).with(Negotiate::new(Arc::clone(&self.codecs))).with(ExtractParams);
        if capability.closes_body() {
            chain.push(CloseBody);
        }
        chain.extend(resource.middleware(&capability.method()));
        chain
    }
}

impl fmt::Debug for ApiBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiBuilder")
            .field("codecs", &self.codecs)
            .field("dependencies", &self.dependencies)
            .field("aliases", &self.aliases)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

fn options_chain(resource: &dyn Resource) -> Chain {
    let mut chain = Chain::new().with(Recover).with(ExtractParams);
    chain.extend(resource.middleware(&Method::OPTIONS));
    chain
}

fn join_path(segments: &[&str]) -> String {
    let mut path = String::new();
    for segment in segments.iter().map(|segment| segment.trim_matches('/')).filter(|segment| !segment.is_empty()) {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
