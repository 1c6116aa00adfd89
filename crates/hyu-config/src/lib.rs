//! # Hyu Config
//!
//! Layered configuration for the Hyu backend: TOML files under `config/`,
//! a `.env` file and `HYU_*` environment variables, validated at load time.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
