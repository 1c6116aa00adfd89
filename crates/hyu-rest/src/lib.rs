//! # Hyu REST
//!
//! HTTP layer of the Hyu backend: Axum routers per feature, bearer-token
//! middleware with the account-state guard, and the OpenAPI document.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
