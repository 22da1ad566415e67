//! One-shot lookup: `shiptrack-lookup <tracking-number>` prints the
//! aggregated response as JSON.

use std::{env, process, sync::Arc};

use shiptrack_carriers::{AdapterError, AdapterFactory, TrackingAggregator};
use shiptrack_domain::{
    config::ConfigError,
    services::telemetry::{init_telemetry, TelemetryConfig, TelemetryError},
    CarrierRegistry, RegistryError, TrackerConfig,
};
use thiserror::Error;

#[derive(Debug, Error)]
enum LookupError {
    #[error("usage: shiptrack-lookup <tracking-number>")]
    Usage,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("adapter setup failed: {0}")]
    Adapter(#[from] AdapterError),
    #[error("failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("[lookup] {err}");
            process::exit(1);
        }
    }
}

async fn run() -> Result<bool, LookupError> {
    let tracking_number = env::args().nth(1).ok_or(LookupError::Usage)?;

    let tracker_config = TrackerConfig::load_from_env()?;
    init_telemetry(&TelemetryConfig::from_env("LOOKUP"))?;
    let registry = Arc::new(CarrierRegistry::from_env()?);
    let factory = AdapterFactory::new(&tracker_config)?;
    let aggregator = TrackingAggregator::from_factory(registry, &factory);

    let response = aggregator.get_tracking_info(&tracking_number).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.success)
}
