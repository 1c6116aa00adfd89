//! Custom Axum extractors.

mod claims;
mod headers;
mod validated;

pub use claims::*;
pub use headers::*;
pub use validated::*;
