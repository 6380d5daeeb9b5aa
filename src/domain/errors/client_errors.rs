use std::{fmt, io, path::PathBuf};

use thiserror::Error as ThisError;

use super::{BackendError, ValidationError};
use crate::domain::value_objects::ObjectKey;

/// The step of an operation at which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Opening a local file for reading
    Open,
    /// Reading local file metadata
    Stat,
    /// Sending object content to the backend
    Transmit,
    /// Creating a destination directory
    CreateDir,
    /// Opening a read stream for a remote object
    StreamOpen,
    /// Creating or truncating a local destination file
    Create,
    /// Copying a remote stream into a local file
    Copy,
    /// Reading a remote stream into memory
    Read,
    /// Checking the size of a downloaded file
    Verify,
    /// Creating a temporary file
    TempCreate,
    /// Handing a finished temporary file to the caller
    Persist,
    /// Fetching an object straight into a local file
    Fetch,
    /// Requesting object metadata
    Metadata,
    /// Enumerating objects under a prefix
    List,
    /// Removing an object
    Delete,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Open => "open",
            TransferStage::Stat => "stat",
            TransferStage::Transmit => "transmit",
            TransferStage::CreateDir => "create directory",
            TransferStage::StreamOpen => "stream open",
            TransferStage::Create => "create",
            TransferStage::Copy => "copy",
            TransferStage::Read => "read",
            TransferStage::Verify => "size verification",
            TransferStage::TempCreate => "temp file create",
            TransferStage::Persist => "temp file persist",
            TransferStage::Fetch => "fetch",
            TransferStage::Metadata => "metadata request",
            TransferStage::List => "list",
            TransferStage::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`StoreClient`](crate::StoreClient) operations.
///
/// Every variant names the operation it came from, and the variants that can
/// happen at more than one step also carry the [`TransferStage`].
#[derive(ThisError, Debug)]
pub enum ClientError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("{operation}: invalid input: {source}")]
    InvalidInput {
        operation: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("{operation}: {stage} failed for {}: {source}", .path.display())]
    LocalIo {
        operation: &'static str,
        stage: TransferStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation}: {stage} failed for object '{key}': {source}")]
    Backend {
        operation: &'static str,
        stage: TransferStage,
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("{operation}: downloaded file {} is zero bytes", .path.display())]
    ZeroByteDownload {
        operation: &'static str,
        path: PathBuf,
    },

    #[error("{operation}: cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation}: deadline exceeded")]
    DeadlineExceeded { operation: &'static str },
}

impl ClientError {
    pub(crate) fn configuration(err: impl fmt::Display) -> Self {
        ClientError::Configuration {
            message: err.to_string(),
        }
    }

    pub(crate) fn local(
        operation: &'static str,
        stage: TransferStage,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        ClientError::LocalIo {
            operation,
            stage,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn backend(
        operation: &'static str,
        stage: TransferStage,
        key: &ObjectKey,
        source: BackendError,
    ) -> Self {
        ClientError::Backend {
            operation,
            stage,
            key: key.to_string(),
            source,
        }
    }

    /// Whether the failure is the backend reporting that the object is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Backend { source, .. } if source.is_not_found())
    }

    /// The stage at which the failure happened, when it is tied to one
    pub fn stage(&self) -> Option<TransferStage> {
        match self {
            ClientError::LocalIo { stage, .. } | ClientError::Backend { stage, .. } => Some(*stage),
            ClientError::ZeroByteDownload { .. } => Some(TransferStage::Verify),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
