//! # Hyu Domain
//!
//! Entities and the pure rules attached to them: check-in streaks,
//! assessment scoring and banding, goal ordering, account suspension and
//! password-reset issuance windows.

#[macro_use]
mod macros;

pub mod entities;

pub use entities::*;
