use std::io;
use thiserror::Error;

/// Configuration errors raised while assembling a [`CodecRegistry`](crate::CodecRegistry).
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("codec with mime type {0:?} already registered")]
    AlreadyRegistered(String),

    #[error("codec {0:?} is not registered")]
    NotRegistered(String),

    #[error("mime type {0:?} is reserved for the default codec")]
    Reserved(String),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("form encode error: {source}")]
    FormEncode {
        #[from]
        source: serde_urlencoded::ser::Error,
    },

    #[error("form decode error: {source}")]
    FormDecode {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
