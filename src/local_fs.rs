//! Local file helpers shared by the backend port and the client

use std::{
    io,
    path::{Path, PathBuf},
};

use futures::StreamExt;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{domain::errors::BackendError, ports::storage::ByteStream};

/// Removes a partially written file unless [`PartialFile::keep`] is called.
///
/// Dropping the guard (error return, cancellation) deletes the file.
#[derive(Debug)]
pub(crate) struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub(crate) fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove partial file");
                }
            }
        }
    }
}

/// Which side of a stream copy failed
#[derive(Debug)]
pub(crate) enum CopyError {
    Read(BackendError),
    Write(io::Error),
}

impl From<CopyError> for BackendError {
    fn from(err: CopyError) -> Self {
        match err {
            CopyError::Read(e) => e,
            CopyError::Write(e) => BackendError::Io(e),
        }
    }
}

/// Write every chunk of `stream` into `file`, then flush. Returns the byte count.
pub(crate) async fn copy_stream(mut stream: ByteStream, file: &mut File) -> Result<u64, CopyError> {
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(CopyError::Read)?;
        file.write_all(&chunk).await.map_err(CopyError::Write)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(CopyError::Write)?;
    Ok(written)
}

/// Create `destination` and fill it from `stream`, removing it again on failure
pub(crate) async fn write_stream_to_path(
    stream: ByteStream,
    destination: &Path,
) -> Result<u64, BackendError> {
    let mut file = File::create(destination).await?;
    let guard = PartialFile::new(destination);
    let written = copy_stream(stream, &mut file).await?;
    drop(file);
    guard.keep();
    Ok(written)
}
