use async_trait::async_trait;
use bytes::Bytes;
use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt, TryStreamExt,
};
use object_store::{
    buffered::BufWriter, memory::InMemory, path::Path as ObjectPath, Attribute, Attributes,
    ObjectMeta, ObjectStore as ApacheObjectStore, PutOptions as ApachePutOptions, PutPayload,
};
use std::{io, sync::Arc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{
    domain::{
        errors::{BackendError, BackendResult},
        models::{ObjectInfo, PutOptions, StatOutcome},
        value_objects::ObjectKey,
    },
    ports::storage::{ByteStream, ObjectBackend, UploadReader},
};

/// Bytes buffered by a streaming upload before it switches to a multipart upload
pub const DEFAULT_UPLOAD_BUFFER: usize = 10 * 1024 * 1024;

/// Adapter that implements our ObjectBackend port using Apache object_store
pub struct ApacheObjectStoreAdapter {
    inner: Arc<dyn ApacheObjectStore>,
    upload_buffer: usize,
}

impl ApacheObjectStoreAdapter {
    pub fn new(store: Arc<dyn ApacheObjectStore>) -> Self {
        Self {
            inner: store,
            upload_buffer: DEFAULT_UPLOAD_BUFFER,
        }
    }

    /// Adapter over a fresh in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn with_upload_buffer(mut self, bytes: usize) -> Self {
        self.upload_buffer = bytes.max(1);
        self
    }
}

/// The key as a backend path, kept verbatim.
///
/// `ObjectPath::from` would percent-encode reserved characters and store the
/// object under a name the caller never wrote.
fn object_path(key: &ObjectKey) -> BackendResult<ObjectPath> {
    ObjectPath::parse(key.as_str()).map_err(|e| BackendError::InvalidPath {
        message: e.to_string(),
    })
}

/// The deepest whole path segment of a string prefix.
///
/// object_store lists by path segment, so "logs/2024-0" has to be listed from
/// "logs" and filtered afterwards.
fn listing_base(prefix: &str) -> Result<Option<ObjectPath>, object_store::path::Error> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => ObjectPath::parse(&prefix[..idx]).map(Some),
        _ => Ok(None),
    }
}

fn object_info(meta: ObjectMeta) -> BackendResult<ObjectInfo> {
    let key = ObjectKey::new(meta.location.to_string()).map_err(|e| BackendError::InvalidPath {
        message: format!("{}: {}", meta.location, e),
    })?;

    Ok(ObjectInfo {
        key,
        size: meta.size,
        last_modified: meta.last_modified,
        etag: meta.e_tag,
    })
}

fn attributes(options: &PutOptions) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        options.effective_content_type().to_string().into(),
    );

    let headers = [
        (Attribute::ContentEncoding, &options.content_encoding),
        (Attribute::ContentDisposition, &options.content_disposition),
        (Attribute::CacheControl, &options.cache_control),
    ];
    for (attribute, value) in headers {
        if let Some(value) = value {
            attributes.insert(attribute, value.clone().into());
        }
    }

    for (key, value) in &options.user_metadata {
        attributes.insert(Attribute::Metadata(key.clone().into()), value.clone().into());
    }

    attributes
}

/// Recover the object_store error that BufWriter wraps into io::Error
fn from_io(err: io::Error) -> BackendError {
    if !err
        .get_ref()
        .is_some_and(|inner| inner.is::<object_store::Error>())
    {
        return BackendError::Io(err);
    }

    let kind = err.kind();
    match err
        .into_inner()
        .map(|inner| inner.downcast::<object_store::Error>())
    {
        Some(Ok(store_err)) => BackendError::from(*store_err),
        Some(Err(inner)) => BackendError::Io(io::Error::new(kind, inner)),
        None => BackendError::Io(io::Error::from(kind)),
    }
}

async fn abort_upload(writer: &mut BufWriter, key: &ObjectKey) {
    if let Err(e) = writer.abort().await {
        tracing::warn!(key = %key, error = %e, "failed to abort upload");
    }
}

#[async_trait]
impl ObjectBackend for ApacheObjectStoreAdapter {
    async fn put_bytes(
        &self,
        key: &ObjectKey,
        data: Bytes,
        options: &PutOptions,
    ) -> BackendResult<()> {
        let opts = ApachePutOptions {
            attributes: attributes(options),
            ..Default::default()
        };

        self.inner
            .put_opts(&object_path(key)?, PutPayload::from(data), opts)
            .await?;

        Ok(())
    }

    async fn put_stream(
        &self,
        key: &ObjectKey,
        reader: UploadReader,
        length: u64,
        options: &PutOptions,
    ) -> BackendResult<u64> {
        let mut writer =
            BufWriter::with_capacity(Arc::clone(&self.inner), object_path(key)?, self.upload_buffer)
                .with_attributes(attributes(options));

        // Reading one byte past the declared length is enough to spot a longer stream
        let mut limited = reader.take(length.saturating_add(1));
        let copied = match tokio::io::copy(&mut limited, &mut writer).await {
            Ok(copied) => copied,
            Err(e) => {
                abort_upload(&mut writer, key).await;
                return Err(from_io(e));
            }
        };

        if copied != length {
            abort_upload(&mut writer, key).await;
            return Err(BackendError::ContentSizeMismatch {
                expected: length,
                actual: copied,
            });
        }

        writer.shutdown().await.map_err(from_io)?;
        Ok(copied)
    }

    async fn get_stream(&self, key: &ObjectKey) -> BackendResult<ByteStream> {
        let result = self.inner.get(&object_path(key)?).await?;
        Ok(result.into_stream().map_err(BackendError::from).boxed())
    }

    async fn stat(&self, key: &ObjectKey) -> BackendResult<StatOutcome> {
        match self.inner.head(&object_path(key)?).await {
            Ok(meta) => object_info(meta).map(StatOutcome::Found),
            Err(object_store::Error::NotFound { .. }) => Ok(StatOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, BackendResult<ObjectInfo>> {
        // No valid key lies under a base with an empty, dot or control segment
        let base = match listing_base(prefix) {
            Ok(base) => base,
            Err(_) => return stream::empty().boxed(),
        };
        let prefix = prefix.to_string();

        self.inner
            .list(base.as_ref())
            .map(|result| result.map_err(BackendError::from).and_then(object_info))
            .try_filter(move |info| future::ready(info.key.has_prefix(&prefix)))
            .boxed()
    }

    async fn delete(&self, key: &ObjectKey) -> BackendResult<()> {
        match self.inner.delete(&object_path(key)?).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::AttributeValue;
    use std::io::Cursor;

    fn key(value: &str) -> ObjectKey {
        ObjectKey::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_basic_object_operations() {
        let adapter = ApacheObjectStoreAdapter::in_memory();
        let key = key("test/key");
        let data = Bytes::from_static(b"test data");

        adapter
            .put_bytes(&key, data.clone(), &PutOptions::new())
            .await
            .unwrap();

        let chunks: Vec<Bytes> = adapter
            .get_stream(&key)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), data.to_vec());

        match adapter.stat(&key).await.unwrap() {
            StatOutcome::Found(info) => {
                assert_eq!(info.key, key);
                assert_eq!(info.size, data.len() as u64);
            }
            StatOutcome::NotFound => panic!("Expected object to exist"),
        }

        adapter.delete(&key).await.unwrap();
        assert_eq!(adapter.stat(&key).await.unwrap(), StatOutcome::NotFound);

        // Deleting again is not an error
        adapter.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let adapter = ApacheObjectStoreAdapter::in_memory();
        let err = adapter.get_stream(&key("missing")).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_options_become_attributes() {
        let store = Arc::new(InMemory::new());
        let adapter = ApacheObjectStoreAdapter::new(store.clone());
        let key = key("docs/readme.txt");
        let options = PutOptions::new()
            .with_content_type("text/plain")
            .with_metadata("owner", "ops");

        adapter
            .put_bytes(&key, Bytes::from_static(b"hello"), &options)
            .await
            .unwrap();

        let result = store.get(&object_path(&key).unwrap()).await.unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType),
            Some(&AttributeValue::from("text/plain"))
        );
        assert_eq!(
            result.attributes.get(&Attribute::Metadata("owner".into())),
            Some(&AttributeValue::from("ops"))
        );
    }

    #[tokio::test]
    async fn test_reserved_characters_stored_verbatim() {
        let store = Arc::new(InMemory::new());
        let adapter = ApacheObjectStoreAdapter::new(store.clone());

        for name in ["reports/q1#final.csv", "data/[1].bin", "pct/100%.txt", "sp ace/a~b?c"] {
            adapter
                .put_bytes(&key(name), Bytes::from_static(b"x"), &PutOptions::new())
                .await
                .unwrap();
        }

        let mut stored: Vec<String> = store
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .unwrap();
        stored.sort();
        assert_eq!(
            stored,
            vec!["data/[1].bin", "pct/100%.txt", "reports/q1#final.csv", "sp ace/a~b?c"]
        );

        let listed: Vec<ObjectInfo> = adapter.list("reports/q1#").try_collect().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(adapter.stat(&listed[0].key).await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_put_stream_uploads_declared_length() {
        let adapter = ApacheObjectStoreAdapter::in_memory().with_upload_buffer(4);
        let key = key("stream/blob.bin");
        let payload = b"0123456789abcdef".to_vec();

        let sent = adapter
            .put_stream(
                &key,
                Box::new(Cursor::new(payload.clone())),
                payload.len() as u64,
                &PutOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(sent, payload.len() as u64);

        let chunks: Vec<Bytes> = adapter
            .get_stream(&key)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), payload);
    }

    #[tokio::test]
    async fn test_put_stream_rejects_size_mismatch() {
        let adapter = ApacheObjectStoreAdapter::in_memory();
        let short = key("short.bin");
        let long = key("long.bin");

        let err = adapter
            .put_stream(&short, Box::new(Cursor::new(vec![1u8; 5])), 10, &PutOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::ContentSizeMismatch {
                expected: 10,
                actual: 5
            }
        ));

        let err = adapter
            .put_stream(&long, Box::new(Cursor::new(vec![1u8; 8])), 3, &PutOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::ContentSizeMismatch { expected: 3, actual } if actual > 3
        ));

        assert_eq!(adapter.stat(&short).await.unwrap(), StatOutcome::NotFound);
        assert_eq!(adapter.stat(&long).await.unwrap(), StatOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_list_uses_string_prefix() {
        let adapter = ApacheObjectStoreAdapter::in_memory();
        for name in ["logs/2024-01/a", "logs/2024-02/b", "logs2/c", "other"] {
            adapter
                .put_bytes(&key(name), Bytes::from_static(b"x"), &PutOptions::new())
                .await
                .unwrap();
        }

        let list = |prefix: &'static str| {
            let adapter = &adapter;
            async move {
                let mut keys: Vec<String> = adapter
                    .list(prefix)
                    .map_ok(|info| info.key.to_string())
                    .try_collect()
                    .await
                    .unwrap();
                keys.sort();
                keys
            }
        };

        assert_eq!(list("logs/2024-0").await, vec!["logs/2024-01/a", "logs/2024-02/b"]);
        assert_eq!(list("logs").await, vec!["logs/2024-01/a", "logs/2024-02/b", "logs2/c"]);
        assert_eq!(list("logs/").await, vec!["logs/2024-01/a", "logs/2024-02/b"]);
        assert_eq!(list("").await.len(), 4);
        assert!(list("nothing/here").await.is_empty());
    }

    #[test]
    fn test_listing_base() {
        assert_eq!(listing_base("").unwrap(), None);
        assert_eq!(listing_base("logs").unwrap(), None);
        assert_eq!(listing_base("logs/").unwrap(), Some(ObjectPath::from("logs")));
        assert_eq!(listing_base("a/b/c-").unwrap(), Some(ObjectPath::from("a/b")));
        assert_eq!(
            listing_base("q#1/[x]/y").unwrap().map(|p| p.to_string()),
            Some("q#1/[x]".to_string())
        );
        assert!(listing_base("a/../b").is_err());
    }
}
