//! The ten CRUD capabilities a resource can opt into.
//!
//! Each capability pairs one HTTP method with one path shape. The
//! [`Capability`] table is what the router walks when it turns a resource into
//! routes.

use crate::{BoxError, Decode, Payload, QueryParams, RequestContext, Resource};
use async_trait::async_trait;
use http::Method;

/// Provides a single model by primary key.
#[async_trait]
pub trait SingleGetter: Send + Sync {
    async fn get(&self, ctx: &RequestContext, pk: &str) -> Result<Payload, BoxError>;
}

/// Provides the list of available models.
#[async_trait]
pub trait PluralGetter: Send + Sync {
    async fn get_all(&self, ctx: &RequestContext, params: &QueryParams) -> Result<Payload, BoxError>;
}

/// Stores a single model, the primary key segment is available from the context.
#[async_trait]
pub trait SinglePoster: Send + Sync {
    async fn post(&self, ctx: &RequestContext, decode: Decode<'_>) -> Result<Payload, BoxError>;
}

/// Stores a list of models.
#[async_trait]
pub trait PluralPoster: Send + Sync {
    async fn post_all(&self, ctx: &RequestContext, decode: Decode<'_>) -> Result<Payload, BoxError>;
}

/// Patches a single model by primary key.
#[async_trait]
pub trait SinglePatcher: Send + Sync {
    async fn patch(&self, ctx: &RequestContext, pk: &str, decode: Decode<'_>) -> Result<Payload, BoxError>;
}

/// Patches the models selected by the query.
#[async_trait]
pub trait PluralPatcher: Send + Sync {
    async fn patch_all(
        &self,
        ctx: &RequestContext,
        params: &QueryParams,
        decode: Decode<'_>,
    ) -> Result<Payload, BoxError>;
}

/// Replaces a single model by primary key.
#[async_trait]
pub trait SinglePutter: Send + Sync {
    async fn put(&self, ctx: &RequestContext, pk: &str, decode: Decode<'_>) -> Result<Payload, BoxError>;
}

/// Replaces the models selected by the query.
#[async_trait]
pub trait PluralPutter: Send + Sync {
    async fn put_all(
        &self,
        ctx: &RequestContext,
        params: &QueryParams,
        decode: Decode<'_>,
    ) -> Result<Payload, BoxError>;
}

/// Deletes a single model by primary key.
#[async_trait]
pub trait SingleDeleter: Send + Sync {
    async fn delete(&self, ctx: &RequestContext, pk: &str) -> Result<Payload, BoxError>;
}

/// Deletes the models selected by the query.
#[async_trait]
pub trait PluralDeleter: Send + Sync {
    async fn delete_all(&self, ctx: &RequestContext, params: &QueryParams) -> Result<Payload, BoxError>;
}

/// Whether a route addresses the collection or one member of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathShape {
    /// `/{module}/{resource}`
    Plural,
    /// `/{module}/{resource}/{pk}`
    Single,
}

/// Descriptor of one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PluralGetter,
    SingleGetter,
    PluralPoster,
    SinglePoster,
    PluralPatcher,
    SinglePatcher,
    PluralPutter,
    SinglePutter,
    PluralDeleter,
    SingleDeleter,
}

impl Capability {
    /// All capabilities, in the order routes are registered.
    pub const ALL: [Capability; 10] = [
        Capability::PluralGetter,
        Capability::SingleGetter,
        Capability::PluralPoster,
        Capability::SinglePoster,
        Capability::PluralPatcher,
        Capability::SinglePatcher,
        Capability::PluralPutter,
        Capability::SinglePutter,
        Capability::PluralDeleter,
        Capability::SingleDeleter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::PluralGetter => "PluralGetter",
            Capability::SingleGetter => "SingleGetter",
            Capability::PluralPoster => "PluralPoster",
            Capability::SinglePoster => "SinglePoster",
            Capability::PluralPatcher => "PluralPatcher",
            Capability::SinglePatcher => "SinglePatcher",
            Capability::PluralPutter => "PluralPutter",
            Capability::SinglePutter => "SinglePutter",
            Capability::PluralDeleter => "PluralDeleter",
            Capability::SingleDeleter => "SingleDeleter",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Capability::PluralGetter | Capability::SingleGetter => Method::GET,
            Capability::PluralPoster | Capability::SinglePoster => Method::POST,
            Capability::PluralPatcher | Capability::SinglePatcher => Method::PATCH,
            Capability::PluralPutter | Capability::SinglePutter => Method::PUT,
            Capability::PluralDeleter | Capability::SingleDeleter => Method::DELETE,
        }
    }

    pub fn shape(self) -> PathShape {
        match self {
            Capability::PluralGetter
            | Capability::PluralPoster
            | Capability::PluralPatcher
            | Capability::PluralPutter
            | Capability::PluralDeleter => PathShape::Plural,
            Capability::SingleGetter
            | Capability::SinglePoster
            | Capability::SinglePatcher
            | Capability::SinglePutter
            | Capability::SingleDeleter => PathShape::Single,
        }
    }

    /// Requests of this capability may carry a body that must be released after the action.
    pub fn closes_body(self) -> bool {
        self.method() != Method::GET
    }

    /// Looks up this capability on `resource`.
    pub fn is_implemented_by(self, resource: &dyn Resource) -> bool {
        match self {
            Capability::PluralGetter => resource.as_plural_getter().is_some(),
            Capability::SingleGetter => resource.as_single_getter().is_some(),
            Capability::PluralPoster => resource.as_plural_poster().is_some(),
            Capability::SinglePoster => resource.as_single_poster().is_some(),
            Capability::PluralPatcher => resource.as_plural_patcher().is_some(),
            Capability::SinglePatcher => resource.as_single_patcher().is_some(),
            Capability::PluralPutter => resource.as_plural_putter().is_some(),
            Capability::SinglePutter => resource.as_single_putter().is_some(),
            Capability::PluralDeleter => resource.as_plural_deleter().is_some(),
            Capability::SingleDeleter => resource.as_single_deleter().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, PathShape};
    use http::Method;

    #[test]
    fn each_method_has_one_plural_and_one_single_capability() {
        for method in [Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE] {
            let shapes: Vec<_> = Capability::ALL
                .iter()
                .filter(|capability| capability.method() == method)
                .map(|capability| capability.shape())
                .collect();
            assert_eq!(shapes, [PathShape::Plural, PathShape::Single], "{method}");
        }
    }

    #[test]
    fn only_get_keeps_the_body_open() {
        assert!(!Capability::SingleGetter.closes_body());
        assert!(!Capability::PluralGetter.closes_body());
        assert!(Capability::PluralPoster.closes_body());
        assert!(Capability::SingleDeleter.closes_body());
    }
}
