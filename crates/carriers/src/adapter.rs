use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use shiptrack_domain::{CarrierId, CarrierResponse, TrackingInfo};
use tracing::{debug, warn};

use crate::error::AdapterError;

/// One vendor integration. Implementors supply the network half
/// ([`fetch_payload`](Self::fetch_payload)) and the pure transform; the
/// provided methods chain them and flatten failures into a `CarrierResponse`.
#[async_trait]
pub trait CarrierAdapter: Send + Sync {
    fn carrier(&self) -> CarrierId;

    /// Authenticates and retrieves the raw vendor JSON for a tracking number.
    async fn fetch_payload(&self, tracking_number: &str) -> Result<Value, AdapterError>;

    /// Maps a raw vendor payload onto the unified model.
    fn transform(&self, payload: Value) -> Result<TrackingInfo, AdapterError>;

    async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, AdapterError> {
        let payload = self.fetch_payload(tracking_number).await?;
        self.transform(payload)
    }

    /// Never fails: every error becomes a vendor-scoped `{code, message}`.
    async fn get_tracking_info(&self, tracking_number: &str) -> CarrierResponse {
        let carrier = self.carrier();
        match self.track(tracking_number).await {
            Ok(info) => {
                counter!("tracking_adapter_results_total", "carrier" => carrier.as_str(), "result" => "success")
                    .increment(1);
                debug!(%carrier, events = info.events.len(), "carrier lookup succeeded");
                CarrierResponse::success(info)
            }
            Err(err) => {
                let error = err.into_carrier_error(carrier);
                counter!("tracking_adapter_results_total", "carrier" => carrier.as_str(), "result" => "failure")
                    .increment(1);
                warn!(%carrier, code = %error.code, message = %error.message, "carrier lookup failed");
                CarrierResponse::failure(error)
            }
        }
    }
}
