//! A small async client for moving byte blobs and local files to and from a
//! single bucket of an S3-compatible object store.
//!
//! ```no_run
//! use bucket_store::prelude::*;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = StoreClient::new_with_bucket("minio.internal:9000", "access", "secret", "reports")?;
//! let ctx = RequestContext::background();
//! let key = ObjectKey::new("2024/q1.csv").expect("valid key");
//!
//! client.put_file(&ctx, Path::new("q1.csv"), &key, &PutOptions::new()).await?;
//! if client.object_exists(&ctx, &key).await? {
//!     let bytes = client.get_object_bytes(&ctx, &key).await?;
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;

mod local_fs;

// Re-export key types for convenience

// Domain types - value objects, models and errors
pub use domain::{
    BackendError, BackendResult, BucketName, ClientError, ClientResult, Endpoint, ObjectInfo,
    ObjectKey, PutOptions, StatOutcome, TransferStage, ValidationError, DEFAULT_CONTENT_TYPE,
};

// Port types - interface to the storage backend
pub use ports::{ByteStream, ObjectBackend, UploadReader};

// Client and configuration
pub use client::{ObjectListing, ObjectReader, RequestContext, StoreClient};
pub use config::ClientConfig;

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::ApacheObjectStoreAdapter;

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        ApacheObjectStoreAdapter, BucketName, ClientConfig, ClientError, ClientResult,
        ObjectBackend, ObjectInfo, ObjectKey, ObjectListing, PutOptions, RequestContext,
        StoreClient,
    };
}
