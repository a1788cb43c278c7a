use http::StatusCode;
use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// An error that carries the HTTP status it should be answered with.
///
/// Any [`BoxError`] that downcasts to `HttpError` keeps its status when it reaches
/// the responder, every other error is answered with `500 Internal Server Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModuleError {
    #[error("already registered: {0:?}")]
    AlreadyRegistered(String),

    #[error("not registered: {0:?}")]
    NotRegistered(String),
}

#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("no value of type {type_name} has been provided")]
    Missing { type_name: &'static str },
}

impl DependencyError {
    pub fn missing<T: ?Sized>() -> Self {
        Self::Missing { type_name: std::any::type_name::<T>() }
    }
}

/// Errors raised while mounting modules, all of them are configuration mistakes.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("alias already in use {0:?}")]
    AliasInUse(String),

    #[error("unable to inject dependencies into {resource:?}: {source}")]
    Dependency {
        resource: String,
        #[source]
        source: DependencyError,
    },

    #[error("unable to initialize {resource:?}: {source}")]
    Init {
        resource: String,
        #[source]
        source: BoxError,
    },

    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: http::Method, path: String },

    #[error("invalid allowed methods header: {source}")]
    AllowedMethods {
        #[from]
        source: http::header::InvalidHeaderValue,
    },

    #[error("invalid route: {source}")]
    Route {
        #[from]
        source: matchit::InsertError,
    },
}
