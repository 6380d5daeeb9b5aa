//! S3 transport session built on the object_store crate
//!
//! The session always uses TLS and signs requests with a static
//! access-key/secret-key pair. Building it performs no network round trip.

use object_store::{aws::AmazonS3Builder, ClientOptions, ObjectStore as ObjectStoreBackend};
use std::{sync::Arc, time::Duration};

use crate::domain::{
    errors::{ClientError, ClientResult},
    value_objects::{BucketName, Endpoint},
};

/// Everything needed to open an S3 session against one bucket
#[derive(Clone)]
pub struct S3Settings<'a> {
    pub endpoint: &'a Endpoint,
    pub bucket: &'a BucketName,
    pub region: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub request_timeout: Option<Duration>,
}

/// Create an S3 store from validated settings
pub fn create_s3_store(settings: &S3Settings<'_>) -> ClientResult<Arc<dyn ObjectStoreBackend>> {
    let mut client_options = ClientOptions::new().with_allow_http(false);
    if let Some(timeout) = settings.request_timeout {
        client_options = client_options.with_timeout(timeout);
    }

    let store = AmazonS3Builder::new()
        .with_endpoint(settings.endpoint.https_url())
        .with_bucket_name(settings.bucket.as_str())
        .with_region(settings.region)
        .with_access_key_id(settings.access_key)
        .with_secret_access_key(settings.secret_key)
        .with_virtual_hosted_style_request(false)
        .with_allow_http(false)
        .with_client_options(client_options)
        .build()
        .map_err(|e| ClientError::configuration(format!("failed to build S3 session: {}", e)))?;

    Ok(Arc::new(store))
}
