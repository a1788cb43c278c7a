//! Path and method based routing over [`matchit`].

use crate::{BoxHandler, ConfigError, Methods, RequestHandler};
use http::Method;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use tracing::trace;

/// Immutable routing table built by [`RouterBuilder`].
pub struct Router {
    inner: matchit::Router<MethodRoutes>,
}

/// The handlers registered on one path, by method.
#[derive(Default)]
pub struct MethodRoutes {
    handlers: Vec<(Method, BoxHandler)>,
}

impl MethodRoutes {
    fn get(&self, method: &Method) -> Option<&dyn RequestHandler> {
        self.handlers.iter().find(|(m, _)| m == method).map(|(_, handler)| handler.as_ref() as &dyn RequestHandler)
    }

    fn contains(&self, method: &Method) -> bool {
        self.handlers.iter().any(|(m, _)| m == method)
    }

    /// Registered methods, in registration order.
    pub fn methods(&self) -> Methods {
        self.handlers.iter().map(|(method, _)| method.clone()).collect()
    }
}

/// Outcome of looking up a request in the [`Router`].
pub enum RouteResult<'router> {
    Found {
        handler: &'router dyn RequestHandler,
        route_vars: Vec<(String, String)>,
    },
    /// The path exists but has no handler for the method.
    MethodNotAllowed { allowed: Methods },
    NotFound,
}

impl fmt::Debug for MethodRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.iter().map(|(method, _)| method)).finish()
    }
}

impl fmt::Debug for RouteResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteResult::Found { route_vars, .. } => {
                f.debug_struct("Found").field("route_vars", route_vars).finish_non_exhaustive()
            }
            RouteResult::MethodNotAllowed { allowed } => {
                f.debug_struct("MethodNotAllowed").field("allowed", allowed).finish()
            }
            RouteResult::NotFound => f.write_str("NotFound"),
        }
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Finds the handler of `method` on `path`.
    pub fn at(&self, method: &Method, path: &str) -> RouteResult<'_> {
        let Ok(matched) = self.inner.at(path) else {
            trace!(%method, path, "no route matched");
            return RouteResult::NotFound;
        };

        match matched.value.get(method) {
            Some(handler) => {
                let route_vars = matched.params.iter().map(|(key, value)| (key.to_owned(), value.to_owned())).collect();
                RouteResult::Found { handler, route_vars }
            }
            None => RouteResult::MethodNotAllowed { allowed: matched.value.methods() },
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

/// Collects routes, rejecting a second handler for the same method and path.
///
/// Every new path is checked against the paths already collected, so a path
/// the router would refuse fails here instead of in [`RouterBuilder::build`].
pub struct RouterBuilder {
    routes: BTreeMap<String, MethodRoutes>,
    shape: matchit::Router<()>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self { routes: BTreeMap::new(), shape: matchit::Router::new() }
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, path: impl Into<String>, method: Method, handler: BoxHandler) -> Result<(), ConfigError> {
        let path = path.into();
        if !self.routes.contains_key(&path) {
            self.shape.insert(path.clone(), ())?;
        }

        let routes = self.routes.entry(path.clone()).or_default();
        if routes.contains(&method) {
            return Err(ConfigError::DuplicateRoute { method, path });
        }
        routes.handlers.push((method, handler));
        Ok(())
    }

    /// Moves every route of `other` into this builder.
    ///
    /// Nothing is moved when any of them is already registered here, or when a
    /// new path conflicts with a registered one.
    pub fn merge(&mut self, other: RouterBuilder) -> Result<(), ConfigError> {
        let mut shape = self.shape.clone();
        for (path, routes) in &other.routes {
            let Some(existing) = self.routes.get(path) else {
                shape.insert(path.clone(), ())?;
                continue;
            };
            if let Some((method, _)) = routes.handlers.iter().find(|(method, _)| existing.contains(method)) {
                return Err(ConfigError::DuplicateRoute { method: method.clone(), path: path.clone() });
            }
        }
        self.shape = shape;

        for (path, routes) in other.routes {
            match self.routes.entry(path) {
                Entry::Vacant(entry) => {
                    entry.insert(routes);
                }
                Entry::Occupied(mut entry) => entry.get_mut().handlers.extend(routes.handlers),
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn build(self) -> Result<Router, matchit::InsertError> {
        let mut inner = matchit::Router::new();
        for (path, routes) in self.routes {
            inner.insert(path, routes)?;
        }
        Ok(Router { inner })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.routes.iter().map(|(path, routes)| (path, routes.methods()))).finish()
    }
}
