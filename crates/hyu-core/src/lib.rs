//! # Hyu Core
//!
//! Core types shared by every layer of the Hyu backend: the unified error,
//! pagination primitives, the feed cursor codec and the KST business clock.

pub mod clock;
pub mod cursor;
pub mod error;
pub mod pagination;
pub mod result;
pub mod text;
pub mod validation;

pub use clock::*;
pub use cursor::*;
pub use error::*;
pub use pagination::*;
pub use result::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
