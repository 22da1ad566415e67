use std::sync::Arc;

use shiptrack_carriers::TrackingAggregator;
use shiptrack_domain::services::telemetry::TelemetryGuard;

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<TrackingAggregator>,
    telemetry: TelemetryGuard,
}

impl AppState {
    pub fn new(aggregator: Arc<TrackingAggregator>, telemetry: TelemetryGuard) -> Self {
        Self {
            aggregator,
            telemetry,
        }
    }

    pub fn aggregator(&self) -> &TrackingAggregator {
        self.aggregator.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }
}
