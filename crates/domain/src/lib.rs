//! Domain-level building blocks shared by the carrier adapters, the HTTP API
//! and the lookup binary: the unified tracking model, the carrier registry,
//! environment configuration and process-wide services.

pub mod config;
pub mod model;
pub mod registry;
pub mod services;

pub use config::{ApiConfig, CarrierSettings, ConfigError, Environment, TrackerConfig};
pub use model::*;
pub use registry::*;
pub use services::*;
