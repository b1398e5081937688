//! Error types for the pipeline engine.

use std::sync::Arc;

/// The main error type for stream evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A Head stage was asked to wrap a sink. Only operation stages can wrap.
    #[error("Head stage cannot wrap a sink")]
    HeadWrap,

    /// A user supplied predicate, transform or combiner failed
    #[error("Callback error: {0}")]
    Callback(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// An element source failed to produce its items
    #[error("Source error: {0}")]
    SourceFailed(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A single-pass element source was traversed a second time
    #[error("Element source was already consumed by an earlier evaluation")]
    SourceConsumed,

    /// The shared stage arena lock was poisoned
    #[error("Stage arena lock poisoned")]
    Poisoned,

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a callback error from any error type
    pub fn callback<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Callback(Arc::new(error))
    }

    /// Create a source error from any error type
    pub fn source_failed<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::SourceFailed(Arc::new(error))
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::Poisoned
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting errors into our Error type
pub trait IntoError<T> {
    fn into_callback_error(self) -> Result<T>;
    fn into_source_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_callback_error(self) -> Result<T> {
        self.map_err(Error::callback)
    }

    fn into_source_error(self) -> Result<T> {
        self.map_err(Error::source_failed)
    }
}
