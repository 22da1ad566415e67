//! Shared service helpers such as OAuth token caching and telemetry wiring.

pub mod telemetry;
pub mod token_cache;

pub use telemetry::*;
pub use token_cache::*;
