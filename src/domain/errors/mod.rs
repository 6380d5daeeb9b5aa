mod backend_errors;
mod client_errors;
mod validation_errors;

pub use backend_errors::*;
pub use client_errors::*;
pub use validation_errors::*;
