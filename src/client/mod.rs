//! The bucket-bound object storage client

mod context;
mod listing;

pub use context::RequestContext;
pub use listing::ObjectListing;

use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use tokio::fs::{DirBuilder, File};
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

use crate::{
    adapters::outbound::storage::{create_s3_store, ApacheObjectStoreAdapter, S3Settings},
    config::ClientConfig,
    domain::{
        errors::{ClientError, ClientResult, TransferStage, ValidationError},
        models::{ObjectInfo, PutOptions, StatOutcome},
        value_objects::{BucketName, Endpoint, ObjectKey},
    },
    local_fs::{self, CopyError, PartialFile},
    ports::storage::ObjectBackend,
};

/// Permission bits for directories created by [`StoreClient::download`]
pub const DOWNLOAD_DIR_MODE: u32 = 0o755;

/// Prefix of files created by [`StoreClient::object_to_tempfile`]
pub const TEMPFILE_PREFIX: &str = "object-";

/// Async reader over an object body, returned by [`StoreClient::open_object`]
pub type ObjectReader = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// Client bound to a single bucket of an object-storage backend.
///
/// Cloning is cheap and clones share the transport session. All operations
/// take `&self` and may run concurrently.
#[derive(Clone)]
pub struct StoreClient {
    bucket: BucketName,
    endpoint: Option<Endpoint>,
    backend: Arc<dyn ObjectBackend>,
    temp_dir: PathBuf,
}

impl StoreClient {
    /// Connect to `bucket` at `endpoint` (`host[:port]`, always over TLS) with static credentials.
    ///
    /// No request is sent; bad credentials only show up on first use.
    pub fn new_with_bucket(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> ClientResult<Self> {
        Self::connect(&ClientConfig::new(endpoint, access_key, secret_key, bucket))
    }

    /// Build a client from configuration
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let endpoint = Endpoint::parse(&config.endpoint).map_err(ClientError::configuration)?;
        let bucket = BucketName::new(config.bucket.as_str()).map_err(ClientError::configuration)?;

        if config.access_key.is_empty() {
            return Err(ClientError::configuration(ValidationError::EmptyCredential(
                "access_key",
            )));
        }
        if config.secret_key.is_empty() {
            return Err(ClientError::configuration(ValidationError::EmptyCredential(
                "secret_key",
            )));
        }

        let store = create_s3_store(&S3Settings {
            endpoint: &endpoint,
            bucket: &bucket,
            region: &config.region,
            access_key: &config.access_key,
            secret_key: &config.secret_key,
            request_timeout: config.request_timeout,
        })?;

        debug!(endpoint = %endpoint, bucket = %bucket, "created store client");

        Ok(Self {
            bucket,
            endpoint: Some(endpoint),
            backend: Arc::new(ApacheObjectStoreAdapter::new(store)),
            temp_dir: config.temp_dir.clone(),
        })
    }

    /// Bind a client to any backend implementation
    pub fn with_backend(bucket: BucketName, backend: Arc<dyn ObjectBackend>) -> Self {
        Self {
            bucket,
            endpoint: None,
            backend,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Client over a fresh in-process store, for tests and local tooling
    pub fn in_memory(bucket: &str) -> ClientResult<Self> {
        let bucket = BucketName::new(bucket).map_err(ClientError::configuration)?;
        Ok(Self::with_backend(
            bucket,
            Arc::new(ApacheObjectStoreAdapter::in_memory()),
        ))
    }

    /// Use `temp_dir` for [`StoreClient::object_to_tempfile`]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// The bucket every key is resolved against
    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    /// The remote endpoint, `None` for clients built on a custom backend
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Directory that receives files from [`StoreClient::object_to_tempfile`]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Upload a local file. The length sent is the file size at the time of the
    /// stat, so a file that changes during the upload fails with a content size error.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key, path = %path.display()))]
    pub async fn put_file(
        &self,
        ctx: &RequestContext,
        path: &Path,
        key: &ObjectKey,
        options: &PutOptions,
    ) -> ClientResult<u64> {
        const OP: &str = "put_file";
        validate_options(OP, options)?;

        ctx.run(OP, async {
            let file = File::open(path)
                .await
                .map_err(|e| ClientError::local(OP, TransferStage::Open, path, e))?;
            let length = file
                .metadata()
                .await
                .map_err(|e| ClientError::local(OP, TransferStage::Stat, path, e))?
                .len();

            let sent = self
                .backend
                .put_stream(key, Box::new(file), length, options)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::Transmit, key, e))?;

            debug!(bytes = sent, "uploaded file");
            Ok(sent)
        })
        .await
    }

    /// Upload an in-memory buffer as the full content of `key`
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn put_object_bytes(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        data: impl Into<Bytes>,
        options: &PutOptions,
    ) -> ClientResult<()> {
        const OP: &str = "put_object_bytes";
        validate_options(OP, options)?;
        let data = data.into();
        let length = data.len();

        ctx.run(OP, async {
            self.backend
                .put_bytes(key, data, options)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::Transmit, key, e))?;

            debug!(bytes = length, "uploaded buffer");
            Ok(())
        })
        .await
    }

    /// Download `key` to `dest_dir/filename`, creating `dest_dir` and its parents first
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key, dir = %dest_dir.display()))]
    pub async fn download(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        dest_dir: &Path,
        filename: &str,
    ) -> ClientResult<u64> {
        const OP: &str = "download";

        ctx.run(OP, async {
            let mut builder = DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(DOWNLOAD_DIR_MODE);
            builder
                .create(dest_dir)
                .await
                .map_err(|e| ClientError::local(OP, TransferStage::CreateDir, dest_dir, e))?;

            let target = dest_dir.join(filename);
            let written = self
                .backend
                .fetch_to_file(key, &target)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::Fetch, key, e))?;

            debug!(bytes = written, path = %target.display(), "downloaded object");
            Ok(written)
        })
        .await
    }

    /// Download `key` to `out_path`, replacing any existing file.
    ///
    /// A zero-byte result is reported as [`ClientError::ZeroByteDownload`] even
    /// though the transfer itself succeeded. The file is removed on any failure.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key, path = %out_path.display()))]
    pub async fn download_object(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
        out_path: &Path,
    ) -> ClientResult<u64> {
        const OP: &str = "download_object";

        ctx.run(OP, async {
            let stream = self
                .backend
                .get_stream(key)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::StreamOpen, key, e))?;

            let mut file = File::create(out_path)
                .await
                .map_err(|e| ClientError::local(OP, TransferStage::Create, out_path, e))?;
            let guard = PartialFile::new(out_path);

            local_fs::copy_stream(stream, &mut file)
                .await
                .map_err(|e| match e {
                    CopyError::Read(e) => ClientError::backend(OP, TransferStage::Copy, key, e),
                    CopyError::Write(e) => {
                        ClientError::local(OP, TransferStage::Copy, out_path, e)
                    }
                })?;

            let size = file
                .metadata()
                .await
                .map_err(|e| ClientError::local(OP, TransferStage::Verify, out_path, e))?
                .len();
            if size == 0 {
                return Err(ClientError::ZeroByteDownload {
                    operation: OP,
                    path: out_path.to_path_buf(),
                });
            }

            drop(file);
            guard.keep();
            debug!(bytes = size, "downloaded object");
            Ok(size)
        })
        .await
    }

    /// Read the whole object into memory. No size limit is applied.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn get_object_bytes(&self, ctx: &RequestContext, key: &ObjectKey) -> ClientResult<Bytes> {
        const OP: &str = "get_object_bytes";

        ctx.run(OP, async {
            let mut stream = self
                .backend
                .get_stream(key)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::StreamOpen, key, e))?;

            let mut buffer = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| ClientError::backend(OP, TransferStage::Read, key, e))?;
                buffer.extend_from_slice(&chunk);
            }

            debug!(bytes = buffer.len(), "read object");
            Ok(buffer.freeze())
        })
        .await
    }

    /// Copy the object into a new uniquely named file in the temp directory.
    ///
    /// The caller owns the returned file and is responsible for removing it.
    /// Nothing is left behind when the download fails.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn object_to_tempfile(&self, ctx: &RequestContext, key: &ObjectKey) -> ClientResult<PathBuf> {
        const OP: &str = "object_to_tempfile";

        ctx.run(OP, async {
            let temp = tempfile::Builder::new()
                .prefix(TEMPFILE_PREFIX)
                .tempfile_in(&self.temp_dir)
                .map_err(|e| ClientError::local(OP, TransferStage::TempCreate, &self.temp_dir, e))?;
            let temp_path = temp.path().to_path_buf();

            let stream = self
                .backend
                .get_stream(key)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::StreamOpen, key, e))?;

            let handle = temp
                .reopen()
                .map_err(|e| ClientError::local(OP, TransferStage::Create, &temp_path, e))?;
            let mut file = File::from_std(handle);
            local_fs::copy_stream(stream, &mut file)
                .await
                .map_err(|e| match e {
                    CopyError::Read(e) => ClientError::backend(OP, TransferStage::Copy, key, e),
                    CopyError::Write(e) => {
                        ClientError::local(OP, TransferStage::Copy, &temp_path, e)
                    }
                })?;
            drop(file);

            let (_, path) = temp
                .keep()
                .map_err(|e| ClientError::local(OP, TransferStage::Persist, &temp_path, e.error))?;

            debug!(path = %path.display(), "downloaded object to temp file");
            Ok(path)
        })
        .await
    }

    /// Whether an object exists at `key`. Absence is `Ok(false)`, never an error.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn object_exists(&self, ctx: &RequestContext, key: &ObjectKey) -> ClientResult<bool> {
        const OP: &str = "object_exists";
        let outcome = self.stat_with(ctx, OP, key).await?;
        Ok(outcome.exists())
    }

    /// Metadata for `key`, or `None` when there is no such object
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn stat_object(
        &self,
        ctx: &RequestContext,
        key: &ObjectKey,
    ) -> ClientResult<Option<ObjectInfo>> {
        const OP: &str = "stat_object";
        let outcome = self.stat_with(ctx, OP, key).await?;
        Ok(outcome.into_info())
    }

    async fn stat_with(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        key: &ObjectKey,
    ) -> ClientResult<StatOutcome> {
        ctx.run(operation, async {
            self.backend
                .stat(key)
                .await
                .map_err(|e| ClientError::backend(operation, TransferStage::Metadata, key, e))
        })
        .await
    }

    /// Lazily list every object whose key starts with `prefix`, recursively.
    /// An empty prefix lists the whole bucket.
    pub fn list_objects(&self, ctx: &RequestContext, prefix: &str) -> ObjectListing<'_> {
        const OP: &str = "list_objects";
        debug!(bucket = %self.bucket, prefix, "listing objects");

        let scope = prefix.to_string();
        let items = self
            .backend
            .list(prefix)
            .map_err(move |source| ClientError::Backend {
                operation: OP,
                stage: TransferStage::List,
                key: scope.clone(),
                source,
            })
            .boxed();

        ObjectListing::new(items, ctx.interrupted(OP))
    }

    /// Remove the object at `key`. Removing an absent object succeeds.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn delete_object(&self, ctx: &RequestContext, key: &ObjectKey) -> ClientResult<()> {
        const OP: &str = "delete_object";

        ctx.run(OP, async {
            self.backend
                .delete(key)
                .await
                .map_err(|e| ClientError::backend(OP, TransferStage::Delete, key, e))?;
            debug!("deleted object");
            Ok(())
        })
        .await
    }

    /// Open the object for incremental reading.
    ///
    /// The context only bounds opening the stream; reads from the returned
    /// reader are not subject to it.
    #[instrument(skip_all, fields(bucket = %self.bucket, key = %key))]
    pub async fn open_object(&self, ctx: &RequestContext, key: &ObjectKey) -> ClientResult<ObjectReader> {
        const OP: &str = "open_object";

        let stream = ctx
            .run(OP, async {
                self.backend
                    .get_stream(key)
                    .await
                    .map_err(|e| ClientError::backend(OP, TransferStage::StreamOpen, key, e))
            })
            .await?;

        Ok(StreamReader::new(stream.map_err(io::Error::from).boxed()))
    }
}

fn validate_options(operation: &'static str, options: &PutOptions) -> ClientResult<()> {
    options
        .validate()
        .map_err(|source| ClientError::InvalidInput { operation, source })
}

impl fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreClient")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}
