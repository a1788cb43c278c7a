//! Capability based REST dispatch.
//!
//! A [`Resource`] opts into any subset of ten CRUD capabilities
//! ([`SingleGetter`], [`PluralGetter`], [`SinglePoster`] ...). Resources are
//! grouped by alias into a [`Module`], and mounting a module on an [`ApiBuilder`]
//! turns every implemented capability into a route:
//!
//! | capability | route |
//! |---|---|
//! | `PluralGetter`, `PluralPoster`, `PluralPatcher`, `PluralPutter`, `PluralDeleter` | `/{module}/{resource}` |
//! | `SingleGetter`, `SinglePoster`, `SinglePatcher`, `SinglePutter`, `SingleDeleter` | `/{module}/{resource}/{pk}` |
//!
//! Every path that received at least one route also answers `OPTIONS` with the
//! allowed methods. Request and response bodies go through the codecs negotiated
//! from the `Content-Type` and `Accept` headers.

mod action;
mod api;
mod body;
mod capability;
mod dependency;
mod error;
mod handler;
mod methods;
mod module;
mod request;
mod resource;
mod responder;

pub mod middleware;
pub mod router;

pub use micro_codec as codec;
pub use micro_codec::Payload;

pub use api::Api;
pub use api::ApiBuilder;
pub use api::RouteInfo;
pub use body::OptionReqBody;
pub use body::ResponseBody;
pub use capability::Capability;
pub use capability::PathShape;
pub use capability::PluralDeleter;
pub use capability::PluralGetter;
pub use capability::PluralPatcher;
pub use capability::PluralPoster;
pub use capability::PluralPutter;
pub use capability::SingleDeleter;
pub use capability::SingleGetter;
pub use capability::SinglePatcher;
pub use capability::SinglePoster;
pub use capability::SinglePutter;
pub use dependency::Dependencies;
pub use error::BoxError;
pub use error::ConfigError;
pub use error::DependencyError;
pub use error::HttpError;
pub use error::ModuleError;
pub use handler::BoxHandler;
pub use handler::HandlerResult;
pub use handler::RequestHandler;
pub use methods::Methods;
pub use module::Module;
pub use module::ModuleRegistry;
pub use request::Decode;
pub use request::PathParams;
pub use request::QueryParams;
pub use request::RequestContext;
pub use resource::Resource;

/// Re-exported so resources can implement the capability traits without a direct dependency.
pub use async_trait::async_trait;
