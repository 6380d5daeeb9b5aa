pub mod storage;

// Re-export the port trait for convenience
pub use storage::{ByteStream, ObjectBackend, UploadReader};
