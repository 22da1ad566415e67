//! Carrier adapters and the fan-out aggregator. Embedded by the API process;
//! `main.rs` wraps the same aggregator as a one-shot lookup CLI.

pub mod adapter;
pub mod aggregator;
pub mod context;
pub mod dhl;
pub mod error;
pub mod factory;
pub mod fedex;
pub mod http;
mod transform;
pub mod ups;

pub use adapter::CarrierAdapter;
pub use aggregator::{select_response, TrackingAggregator};
pub use context::{ExecutionContext, ProxyClient};
pub use dhl::DhlAdapter;
pub use error::AdapterError;
pub use factory::AdapterFactory;
pub use fedex::FedexAdapter;
pub use http::{build_http_client, AuthStrategy, ClientCredentials, CredentialStyle, VendorClient};
pub use ups::UpsAdapter;
