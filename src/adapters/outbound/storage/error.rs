use crate::domain::errors::BackendError;

/// Classify object_store errors into backend outcomes.
///
/// Classification goes by error variant; the backend's message text is only
/// kept for display.
impl From<object_store::Error> for BackendError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BackendError::NotFound { key: path },
            object_store::Error::AlreadyExists { path, .. } => {
                BackendError::AlreadyExists { key: path }
            }
            object_store::Error::Precondition { path, .. } => {
                BackendError::Precondition { key: path }
            }
            object_store::Error::Unauthenticated { .. } => BackendError::Unauthenticated {
                message: err.to_string(),
            },
            object_store::Error::PermissionDenied { .. } => BackendError::PermissionDenied {
                message: err.to_string(),
            },
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                BackendError::NotSupported {
                    message: err.to_string(),
                }
            }
            object_store::Error::InvalidPath { .. } => BackendError::InvalidPath {
                message: err.to_string(),
            },
            other => BackendError::Transport {
                message: "object store request failed".to_string(),
                source: Box::new(other),
            },
        }
    }
}
