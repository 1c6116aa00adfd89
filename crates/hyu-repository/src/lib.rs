//! # Hyu Repository
//!
//! Data access for the Hyu backend.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn XxxRepository>   (traits.rs)
//! MySqlXxxRepository            (mysql/, SQLx)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! MySQL
//! ```
//!
//! Every trait also has an in-memory implementation under [`memory`],
//! compiled for tests and behind the `testing` feature.

pub mod mysql;
pub mod pool;
pub mod query;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use mysql::*;
pub use pool::*;
pub use query::*;
pub use traits::*;
