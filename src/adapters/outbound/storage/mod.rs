// Backend error classification
pub mod error;

// Storage implementations
pub mod apache_object_store_adapter;

// Provider-specific session builders
pub mod s3;

// Re-export key types
pub use apache_object_store_adapter::{ApacheObjectStoreAdapter, DEFAULT_UPLOAD_BUFFER};
pub use s3::{create_s3_store, S3Settings};
