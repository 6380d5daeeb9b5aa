use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::{
    domain::{
        errors::BackendResult,
        models::{ObjectInfo, PutOptions, StatOutcome},
        value_objects::ObjectKey,
    },
    local_fs,
};

/// Stream of object body chunks
pub type ByteStream = BoxStream<'static, BackendResult<Bytes>>;

/// Local source for a streaming upload
pub type UploadReader = Box<dyn AsyncRead + Unpin + Send>;

/// Port for the object-storage backend.
///
/// An implementation is a session bound to exactly one bucket; keys are
/// always relative to it. Implementations must be safe to call concurrently.
#[async_trait]
pub trait ObjectBackend: Send + Sync + 'static {
    /// Store `data` as the full content of `key`
    async fn put_bytes(
        &self,
        key: &ObjectKey,
        data: Bytes,
        options: &PutOptions,
    ) -> BackendResult<()>;

    /// Store exactly `length` bytes read from `reader`.
    ///
    /// A reader that yields fewer or more bytes than declared fails with
    /// `BackendError::ContentSizeMismatch` and leaves no object behind.
    async fn put_stream(
        &self,
        key: &ObjectKey,
        reader: UploadReader,
        length: u64,
        options: &PutOptions,
    ) -> BackendResult<u64>;

    /// Open a read stream over the object body
    async fn get_stream(&self, key: &ObjectKey) -> BackendResult<ByteStream>;

    /// Metadata-only lookup
    async fn stat(&self, key: &ObjectKey) -> BackendResult<StatOutcome>;

    /// Lazily enumerate every object whose key starts with `prefix`, recursively.
    ///
    /// Errors are yielded per item and do not end the enumeration.
    fn list(&self, prefix: &str) -> BoxStream<'_, BackendResult<ObjectInfo>>;

    /// Remove an object. Removing an absent key succeeds.
    async fn delete(&self, key: &ObjectKey) -> BackendResult<()>;

    /// Fetch an object straight into a local file, creating or truncating it.
    /// The file is removed again if the transfer fails.
    async fn fetch_to_file(&self, key: &ObjectKey, destination: &Path) -> BackendResult<u64> {
        let stream = self.get_stream(key).await?;
        local_fs::write_stream_to_path(stream, destination).await
    }
}
