use crate::middleware::Chain;
use crate::{
    BoxError, Dependencies, DependencyError, PluralDeleter, PluralGetter, PluralPatcher, PluralPoster, PluralPutter,
    SingleDeleter, SingleGetter, SinglePatcher, SinglePoster, SinglePutter,
};
use http::Method;

/// An object exposed through the router.
///
/// Every capability accessor defaults to `None`; a resource announces what it
/// implements by overriding the matching accessors, which the [`capabilities!`]
/// macro does for you:
///
/// ```
/// use micro_rest::{BoxError, Payload, QueryParams, RequestContext, Resource, SingleGetter, PluralGetter, async_trait};
///
/// struct Users;
///
/// impl Resource for Users {
///     micro_rest::capabilities!(SingleGetter, PluralGetter);
/// }
///
/// #[async_trait]
/// impl SingleGetter for Users {
///     async fn get(&self, _ctx: &RequestContext, pk: &str) -> Result<Payload, BoxError> {
///         Ok(serde_json::json!({ "id": pk }))
///     }
/// }
///
/// #[async_trait]
/// impl PluralGetter for Users {
///     async fn get_all(&self, _ctx: &RequestContext, _params: &QueryParams) -> Result<Payload, BoxError> {
///         Ok(serde_json::json!([]))
///     }
/// }
/// ```
///
/// [`capabilities!`]: crate::capabilities
pub trait Resource: Send + Sync + 'static {
    /// Picks the values this resource depends on, called once when mounted.
    fn inject(&self, _deps: &Dependencies) -> Result<(), DependencyError> {
        Ok(())
    }

    /// Called once when mounted, after [`Resource::inject`]. A failure aborts the mount.
    fn init(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Custom middleware for `method`, it runs right before the action.
    fn middleware(&self, _method: &Method) -> Chain {
        Chain::new()
    }

    fn as_single_getter(&self) -> Option<&dyn SingleGetter> {
        None
    }

    fn as_plural_getter(&self) -> Option<&dyn PluralGetter> {
        None
    }

    fn as_single_poster(&self) -> Option<&dyn SinglePoster> {
        None
    }

    fn as_plural_poster(&self) -> Option<&dyn PluralPoster> {
        None
    }

    fn as_single_patcher(&self) -> Option<&dyn SinglePatcher> {
        None
    }

    fn as_plural_patcher(&self) -> Option<&dyn PluralPatcher> {
        None
    }

    fn as_single_putter(&self) -> Option<&dyn SinglePutter> {
        None
    }

    fn as_plural_putter(&self) -> Option<&dyn PluralPutter> {
        None
    }

    fn as_single_deleter(&self) -> Option<&dyn SingleDeleter> {
        None
    }

    fn as_plural_deleter(&self) -> Option<&dyn PluralDeleter> {
        None
    }
}

/// Implements the [`Resource`] accessors for the listed capabilities.
///
/// Used inside an `impl Resource for T` block, next to any other overridden
/// method.
#[macro_export]
macro_rules! capabilities {
    (@accessor SingleGetter) => {
        fn as_single_getter(&self) -> ::std::option::Option<&dyn $crate::SingleGetter> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor PluralGetter) => {
        fn as_plural_getter(&self) -> ::std::option::Option<&dyn $crate::PluralGetter> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor SinglePoster) => {
        fn as_single_poster(&self) -> ::std::option::Option<&dyn $crate::SinglePoster> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor PluralPoster) => {
        fn as_plural_poster(&self) -> ::std::option::Option<&dyn $crate::PluralPoster> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor SinglePatcher) => {
        fn as_single_patcher(&self) -> ::std::option::Option<&dyn $crate::SinglePatcher> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor PluralPatcher) => {
        fn as_plural_patcher(&self) -> ::std::option::Option<&dyn $crate::PluralPatcher> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor SinglePutter) => {
        fn as_single_putter(&self) -> ::std::option::Option<&dyn $crate::SinglePutter> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor PluralPutter) => {
        fn as_plural_putter(&self) -> ::std::option::Option<&dyn $crate::PluralPutter> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor SingleDeleter) => {
        fn as_single_deleter(&self) -> ::std::option::Option<&dyn $crate::SingleDeleter> {
            ::std::option::Option::Some(self)
        }
    };
    (@accessor PluralDeleter) => {
        fn as_plural_deleter(&self) -> ::std::option::Option<&dyn $crate::PluralDeleter> {
            ::std::option::Option::Some(self)
        }
    };
    ($($capability:ident),+ $(,)?) => {
        $( $crate::capabilities!(@accessor $capability); )+
    };
}
