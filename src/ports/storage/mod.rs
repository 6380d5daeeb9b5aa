mod object_backend;

pub use object_backend::{ByteStream, ObjectBackend, UploadReader};
