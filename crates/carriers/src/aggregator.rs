//! Fan-out lookup across every configured carrier.

use std::sync::Arc;

use metrics::counter;
use shiptrack_domain::{
    normalize_tracking_number, CarrierError, CarrierId, CarrierRegistry, CarrierResponse,
};
use tracing::{error, info, warn};

use crate::{adapter::CarrierAdapter, factory::AdapterFactory};

pub struct TrackingAggregator {
    registry: Arc<CarrierRegistry>,
    adapters: Vec<Arc<dyn CarrierAdapter>>,
}

impl TrackingAggregator {
    pub fn new(registry: Arc<CarrierRegistry>, adapters: Vec<Arc<dyn CarrierAdapter>>) -> Self {
        Self { registry, adapters }
    }

    pub fn from_factory(registry: Arc<CarrierRegistry>, factory: &AdapterFactory) -> Self {
        let adapters = factory.build_all(&registry);
        Self::new(registry, adapters)
    }

    pub fn registry(&self) -> &CarrierRegistry {
        &self.registry
    }

    pub fn adapter(&self, carrier: CarrierId) -> Option<&Arc<dyn CarrierAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.carrier() == carrier)
    }

    /// Queries every adapter concurrently and picks one result. Never fails;
    /// a panicking adapter is reported as `UNKNOWN_ERROR` for its carrier.
    pub async fn get_tracking_info(&self, tracking_number: &str) -> CarrierResponse {
        let Some(number) = normalize_tracking_number(tracking_number) else {
            counter!("tracking_lookups_total", "result" => "invalid").increment(1);
            return CarrierResponse::failure(CarrierError::new(
                CarrierError::INVALID_TRACKING_NUMBER,
                "tracking number is required",
            ));
        };

        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let number = number.clone();
                let carrier = adapter.carrier();
                let handle =
                    tokio::spawn(async move { adapter.get_tracking_info(&number).await });
                (carrier, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (carrier, handle) in handles {
            let response = match handle.await {
                Ok(response) => response,
                Err(err) => {
                    error!(%carrier, error = %err, "carrier lookup task aborted");
                    CarrierResponse::failure(CarrierError::new(
                        CarrierError::UNKNOWN_ERROR,
                        format!("{}: lookup aborted unexpectedly", carrier.display_name()),
                    ))
                }
            };
            results.push(response.with_carrier(carrier));
        }

        select_response(&self.registry, &number, results)
    }
}

/// Chooses among tagged adapter results: the first success whose carrier
/// pattern matches `tracking_number`, else the first success in registry
/// order, else `NO_CARRIER_FOUND`.
pub fn select_response(
    registry: &CarrierRegistry,
    tracking_number: &str,
    results: Vec<CarrierResponse>,
) -> CarrierResponse {
    let priority = |carrier: Option<CarrierId>| {
        carrier
            .and_then(|carrier| registry.carriers().position(|known| known == carrier))
            .unwrap_or(usize::MAX)
    };

    let mut successes: Vec<_> = results
        .into_iter()
        .filter(|response| response.success && response.data.is_some())
        .collect();
    successes.sort_by_key(|response| priority(response.carrier));

    let matched = successes.iter().position(|response| {
        response
            .carrier
            .is_some_and(|carrier| registry.validate_tracking_number(carrier, tracking_number))
    });

    match matched {
        Some(index) => {
            counter!("tracking_lookups_total", "result" => "matched").increment(1);
            successes.swap_remove(index)
        }
        None if !successes.is_empty() => {
            let chosen = successes.swap_remove(0);
            info!(
                carrier = ?chosen.carrier,
                "no successful carrier matches the number format, using registry priority"
            );
            counter!("tracking_lookups_total", "result" => "fallback").increment(1);
            chosen
        }
        None => {
            counter!("tracking_lookups_total", "result" => "not_found").increment(1);
            warn!(tracking_number, "no carrier returned tracking data");
            CarrierResponse::failure(CarrierError::new(
                CarrierError::NO_CARRIER_FOUND,
                format!("Could not find tracking information for {tracking_number}"),
            ))
        }
    }
}
