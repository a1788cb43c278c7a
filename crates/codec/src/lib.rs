//! Wire format layer of the micro rest dispatcher.
//!
//! A [`Codec`] transcodes the serde data tree ([`Payload`]) to and from one wire
//! format identified by a mime type. Codecs are created per request by a
//! [`CodecFactory`], and factories are looked up by mime type through the
//! [`CodecRegistry`].
//!
//! # Example
//! ```
//! use micro_codec::{CodecExt, default_registry};
//!
//! let registry = default_registry();
//! let codec = registry.resolve("application/json").unwrap();
//! let bytes = codec.encode_bytes(&serde_json::json!({"foo": "bar"})).unwrap();
//! assert_eq!(&bytes[..], br#"{"foo":"bar"}"#);
//! ```

mod codec;
mod error;
mod form;
mod json;
mod registry;

pub use codec::Codec;
pub use codec::CodecExt;
pub use codec::CodecFactory;
pub use codec::Decoder;
pub use codec::Encoder;
pub use codec::Payload;
pub use codec::shared;
pub use error::CodecError;
pub use error::RegistryError;
pub use form::FORM_MIME_TYPE;
pub use form::Form;
pub use json::JSON_MIME_TYPE;
pub use json::Json;
pub use registry::CodecRegistry;

/// Creates a registry holding the JSON and form codecs, with JSON as the default.
pub fn default_registry() -> CodecRegistry {
    CodecRegistry::with_builtin_codecs()
}
