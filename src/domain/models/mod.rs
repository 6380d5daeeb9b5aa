pub mod object;
pub mod put_options;

pub use object::{ObjectInfo, StatOutcome};
pub use put_options::{PutOptions, DEFAULT_CONTENT_TYPE};
