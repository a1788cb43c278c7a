//! Mime type to codec resolution.
//!
//! The registry is meant to be filled once at start-up and then shared (read
//! only) between all requests. The empty string and `*/*` are reserved keys that
//! alias the default codec.

use crate::{Codec, CodecFactory, FORM_MIME_TYPE, Form, JSON_MIME_TYPE, Json, RegistryError, shared};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

const DEFAULT_KEY: &str = "";
const WILDCARD_KEY: &str = "*/*";

type SharedFactory = Arc<dyn CodecFactory>;

/// A mime type keyed table of codec factories.
pub struct CodecRegistry {
    factories: RwLock<BTreeMap<String, SharedFactory>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self { factories: RwLock::new(BTreeMap::new()) }
    }

    pub(crate) fn with_builtin_codecs() -> Self {
        let json: SharedFactory = Arc::new(shared(Json));
        let form: SharedFactory = Arc::new(shared(Form));

        let mut factories = BTreeMap::new();
        factories.insert(FORM_MIME_TYPE.to_owned(), form);
        factories.insert(JSON_MIME_TYPE.to_owned(), Arc::clone(&json));
        factories.insert(DEFAULT_KEY.to_owned(), Arc::clone(&json));
        factories.insert(WILDCARD_KEY.to_owned(), json);
        Self { factories: RwLock::new(factories) }
    }

    /// Makes a codec available for the provided mime type.
    ///
    /// Registering a mime type twice is a configuration error, so is registering
    /// one of the reserved default keys.
    pub fn register<F>(&self, mime: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: CodecFactory + 'static,
    {
        let mime = mime.into();
        if is_reserved(&mime) {
            return Err(RegistryError::Reserved(mime));
        }

        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(&mime) {
            return Err(RegistryError::AlreadyRegistered(mime));
        }
        debug!(mime = %mime, "codec registered");
        factories.insert(mime, Arc::new(factory));
        Ok(())
    }

    /// Aliases the reserved default keys to the codec registered for `mime`.
    ///
    /// Can be called several times, the last call wins.
    pub fn set_default(&self, mime: &str) -> Result<(), RegistryError> {
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        let factory = match factories.get(mime) {
            Some(factory) if !is_reserved(mime) => Arc::clone(factory),
            _ => return Err(RegistryError::NotRegistered(mime.to_owned())),
        };
        factories.insert(DEFAULT_KEY.to_owned(), Arc::clone(&factory));
        factories.insert(WILDCARD_KEY.to_owned(), factory);
        debug!(mime = %mime, "default codec set");
        Ok(())
    }

    /// Finds the codec for a `Content-Type` or `Accept` header value.
    ///
    /// An exact key match wins. Otherwise the first registered mime type that the
    /// value starts with, directly followed by a parameter delimiter, is used, so
    /// `multipart/form-data; boundary=xyz` resolves the `multipart/form-data`
    /// codec. `None` means the negotiation failed.
    pub fn resolve(&self, mime: &str) -> Option<Arc<dyn Codec>> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(factory) = factories.get(mime) {
            return Some(factory.create(mime));
        }

        let submatch = factories
            .iter()
            .filter(|(media_type, _)| !is_reserved(media_type))
            .find(|(media_type, _)| mime.strip_prefix(media_type.as_str()).is_some_and(|rest| rest.starts_with(';')));

        match submatch {
            Some((media_type, factory)) => {
                trace!(mime, matched = %media_type, "codec resolved by submatch");
                Some(factory.create(mime))
            }
            None => None,
        }
    }

    /// The default codec, when one has been set.
    pub fn default_codec(&self) -> Option<Arc<dyn Codec>> {
        self.resolve(DEFAULT_KEY)
    }

    /// Registered mime types, without the default aliases.
    pub fn mime_types(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.keys().filter(|mime| !is_reserved(mime)).cloned().collect()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry").field("mime_types", &self.mime_types()).finish()
    }
}

fn is_reserved(mime: &str) -> bool {
    mime == DEFAULT_KEY || mime == WILDCARD_KEY
}

#[cfg(test)]
mod tests {
    use super::CodecRegistry;
    use crate::{Codec, CodecFactory, Form, Json, RegistryError, shared};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        Factory {}

        impl CodecFactory for Factory {
            fn create(&self, mime: &str) -> Arc<dyn Codec>;
        }
    }

    fn registry() -> CodecRegistry {
        let registry = CodecRegistry::new();
        registry.register("application/json", shared(Json)).unwrap();
        registry.register("application/x-www-form-urlencoded", shared(Form)).unwrap();
        registry
    }

    #[test]
    fn exact_match() {
        let codec = registry().resolve("application/json").unwrap();
        assert_eq!(codec.mime_type(), "application/json");
    }

    #[test]
    fn duplicate_registration_keeps_first_codec() {
        let registry = registry();
        let result = registry.register("application/json", shared(Form));
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(mime)) if mime == "application/json"));

        let codec = registry.resolve("application/json").unwrap();
        assert_eq!(codec.mime_type(), "application/json");
    }

    #[test]
    fn reserved_keys_can_not_be_registered() {
        let registry = CodecRegistry::new();
        assert!(matches!(registry.register("", shared(Json)), Err(RegistryError::Reserved(_))));
        assert!(matches!(registry.register("*/*", shared(Json)), Err(RegistryError::Reserved(_))));
    }

    #[test]
    fn no_default_until_set() {
        let registry = registry();
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve("*/*").is_none());
        assert!(registry.default_codec().is_none());
    }

    #[test]
    fn set_default_aliases_reserved_keys() {
        let registry = registry();
        registry.set_default("application/json").unwrap();

        assert_eq!(registry.resolve("").unwrap().mime_type(), "application/json");
        assert_eq!(registry.resolve("*/*").unwrap().mime_type(), "application/json");

        registry.set_default("application/x-www-form-urlencoded").unwrap();
        assert_eq!(registry.default_codec().unwrap().mime_type(), "application/x-www-form-urlencoded");
    }

    #[test]
    fn set_default_requires_registered_codec() {
        let registry = registry();
        assert!(matches!(registry.set_default("text/xml"), Err(RegistryError::NotRegistered(_))));
        assert!(matches!(registry.set_default("*/*"), Err(RegistryError::NotRegistered(_))));
    }

    #[test]
    fn unknown_mime_is_not_resolved() {
        let registry = registry();
        registry.set_default("application/json").unwrap();
        assert!(registry.resolve("text/xml").is_none());
        // a bare prefix without a parameter delimiter is a different type
        assert!(registry.resolve("application/jsonp").is_none());
    }

    #[test]
    fn submatch_passes_full_header_value_to_factory() {
        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .withf(|mime| mime == "multipart/form-data; boundary=----abc")
            .times(1)
            .returning(|_| Arc::new(Json) as Arc<dyn Codec>);

        let registry = registry();
        registry.register("multipart/form-data", factory).unwrap();

        assert!(registry.resolve("multipart/form-data; boundary=----abc").is_some());
    }

    #[test]
    fn submatch_ignores_default_aliases() {
        let registry = registry();
        registry.set_default("application/json").unwrap();
        // "" is a prefix of everything, it must never take part in submatching
        assert!(registry.resolve("; charset=utf-8").is_none());
    }

    #[test]
    fn resolve_is_idempotent() {
        let registry = registry();
        let first = registry.resolve("application/json; charset=utf-8").unwrap();
        let second = registry.resolve("application/json; charset=utf-8").unwrap();
        assert_eq!(first.mime_type(), second.mime_type());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn builtin_codecs_default_to_json() {
        let registry = CodecRegistry::with_builtin_codecs();
        assert_eq!(registry.default_codec().unwrap().mime_type(), "application/json");
        let form = registry.resolve("application/x-www-form-urlencoded").unwrap();
        assert_eq!(form.mime_type(), "application/x-www-form-urlencoded");
        assert_eq!(registry.mime_types(), vec!["application/json", "application/x-www-form-urlencoded"]);
    }

    #[test]
    fn mime_types_skip_default_aliases() {
        let registry = registry();
        registry.set_default("application/json").unwrap();
        assert_eq!(registry.mime_types(), vec!["application/json", "application/x-www-form-urlencoded"]);
    }
}
