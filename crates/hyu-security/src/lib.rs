//! # Hyu Security
//!
//! Access tokens (HS256 JWT), refresh-token sessions, Argon2 password
//! hashing and role checks.

pub mod digest;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use digest::*;
pub use jwt::*;
pub use password::*;
pub use rbac::*;
pub use session::*;
