//! DHL Shipment Tracking (Unified) API. A static `DHL-API-Key` header, no
//! token exchange, and always called directly.

use async_trait::async_trait;
use serde_json::Value;
use shiptrack_domain::{
    format_location, join_location, CarrierConfig, CarrierId, PackageDetails, TrackingEvent,
    TrackingInfo, UNKNOWN,
};

use crate::{
    adapter::CarrierAdapter,
    error::AdapterError,
    http::{endpoint, AuthStrategy, VendorClient},
    transform::{assemble, first_present, format_dimensions, format_measure},
};

mod types;

pub use types::DhlTrackingPayload;
use types::{Event, Place, Shipment};

const API_KEY_HEADER: &str = "DHL-API-Key";

pub struct DhlAdapter {
    config: CarrierConfig,
    http: reqwest::Client,
}

impl DhlAdapter {
    pub fn new(config: CarrierConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn vendor_client(&self) -> Result<VendorClient, AdapterError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| AdapterError::missing_credentials("DHL API key"))?;
        Ok(VendorClient::new(
            CarrierId::Dhl,
            self.http.clone(),
            AuthStrategy::StaticHeader {
                name: API_KEY_HEADER,
                value: api_key.to_string(),
            },
            None,
        ))
    }
}

#[async_trait]
impl CarrierAdapter for DhlAdapter {
    fn carrier(&self) -> CarrierId {
        CarrierId::Dhl
    }

    async fn fetch_payload(&self, tracking_number: &str) -> Result<Value, AdapterError> {
        let client = self.vendor_client()?;
        let mut url = endpoint(self.config.base_url(), &["track", "shipments"])?;
        url.query_pairs_mut()
            .append_pair("trackingNumber", tracking_number);
        client.send_json(client.http().get(url)).await
    }

    fn transform(&self, payload: Value) -> Result<TrackingInfo, AdapterError> {
        transform_payload(payload)
    }
}

pub fn transform_payload(payload: Value) -> Result<TrackingInfo, AdapterError> {
    let payload: DhlTrackingPayload =
        serde_json::from_value(payload).map_err(|err| AdapterError::Decode(err.to_string()))?;
    let shipment = payload
        .shipments
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::NoData("no shipment in DHL response".to_string()))?;

    let events = shipment.events.iter().map(to_event).collect();
    let fallback_status = shipment
        .status
        .as_ref()
        .and_then(|status| first_present([status.status.as_ref(), status.description.as_ref()]));
    let details = package_details(&shipment);

    Ok(assemble(
        events,
        fallback_status,
        shipment.estimated_time_of_delivery.clone(),
        details,
    ))
}

fn address_parts(place: Option<&Place>) -> (Option<&str>, Option<&str>) {
    let address = place.and_then(|place| place.address.as_ref());
    (
        address.and_then(|address| address.address_locality.as_deref()),
        address.and_then(|address| address.address_region.as_deref()),
    )
}

fn to_event(event: &Event) -> TrackingEvent {
    let status = first_present([
        event.status.as_ref(),
        event.description.as_ref(),
        event.status_code.as_ref(),
    ])
    .unwrap_or_else(|| UNKNOWN.to_string());
    let description =
        first_present([event.description.as_ref(), event.status.as_ref()]).unwrap_or_else(|| status.clone());
    let (city, region) = address_parts(event.location.as_ref());

    TrackingEvent {
        status,
        location: format_location(city, region),
        timestamp: first_present([event.timestamp.as_ref()]),
        description,
    }
}

fn package_details(shipment: &Shipment) -> PackageDetails {
    let details = shipment.details.as_ref();
    let place = |place: Option<&Place>| {
        let (city, region) = address_parts(place);
        join_location(city, region)
    };

    PackageDetails {
        service: first_present([
            details
                .and_then(|details| details.product.as_ref())
                .and_then(|product| product.product_name.as_ref()),
            shipment.service.as_ref(),
        ]),
        weight: details
            .and_then(|details| details.weight.as_ref())
            .and_then(|weight| format_measure(weight.value.as_deref(), weight.unit_text.as_deref())),
        dimensions: details
            .and_then(|details| details.dimensions.as_ref())
            .and_then(|dimensions| {
                format_dimensions(
                    dimensions.length.as_deref(),
                    dimensions.width.as_deref(),
                    dimensions.height.as_deref(),
                    dimensions.unit.as_deref(),
                )
            }),
        origin: place(shipment.origin.as_ref()),
        destination: place(shipment.destination.as_ref()),
    }
}
