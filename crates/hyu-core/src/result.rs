//! Result type aliases for Hyu.

use crate::HyuError;

/// A specialized `Result` type for Hyu operations.
pub type HyuResult<T> = Result<T, HyuError>;
