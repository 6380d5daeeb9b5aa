mod bucket_name;
mod endpoint;
mod object_key;

pub use bucket_name::BucketName;
pub use endpoint::Endpoint;
pub use object_key::ObjectKey;
