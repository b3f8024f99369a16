//! Error type shared by the registry, renderer, emitter and scheduler.

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Registry content violates an invariant (duplicate path, bad priority, ...)
    #[error("Invalid registry entry '{path}': {message}")]
    Registry { path: String, message: String },

    /// Asset could not be added to the build output
    #[error("Failed to emit '{file}': {message}")]
    Emit { file: String, message: String },

    /// A resource hint could not be loaded
    #[error("Hint dispatch failed for {url}: {message}")]
    Dispatch { url: String, message: String },
}

impl Error {
    pub fn registry(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registry {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn emit(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Emit {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn dispatch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dispatch {
            url: url.into(),
            message: message.into(),
        }
    }
}
