use std::io;
use thiserror::Error as ThisError;

/// Errors reported by an object-storage backend.
///
/// This is the closed set of outcomes the client reasons about. Backend
/// adapters classify their native errors into these variants, so callers never
/// have to compare error messages.
#[derive(ThisError, Debug)]
pub enum BackendError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("precondition failed for object: {key}")]
    Precondition { key: String },

    /// The upload stream did not produce the declared number of bytes.
    /// `actual` stops counting one byte past `expected`.
    #[error("content size mismatch: declared {expected} bytes, stream produced {actual}")]
    ContentSizeMismatch { expected: u64, actual: u64 },

    #[error("authentication rejected: {message}")]
    Unauthenticated { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("operation not supported: {message}")]
    NotSupported { message: String },

    #[error("invalid object path: {message}")]
    InvalidPath { message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{message}: {source}")]
    Transport {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BackendError {
    /// Whether this is the backend's "no object at this key" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

/// Lets backend failures flow through `AsyncRead` adapters
impl From<BackendError> for io::Error {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(inner) => inner,
            BackendError::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            BackendError::PermissionDenied { .. } | BackendError::Unauthenticated { .. } => {
                io::Error::new(io::ErrorKind::PermissionDenied, err)
            }
            other => io::Error::other(other),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
