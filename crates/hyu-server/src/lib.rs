//! # Hyu Server Library
//!
//! Dependency injection wiring, logging setup and the application runner
//! used by the `hyu-server` binary.

pub mod app;
pub mod di;
pub mod startup;
