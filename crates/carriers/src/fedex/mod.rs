//! FedEx Track API: OAuth client credentials as form fields, then
//! `POST /track/v1/trackingnumbers` with detailed scans.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use shiptrack_domain::{
    format_location, join_location, AccessTokenCache, CarrierConfig, CarrierId, PackageDetails,
    TrackingEvent, TrackingInfo, UNKNOWN,
};

use crate::{
    adapter::CarrierAdapter,
    context::{ExecutionContext, ProxyClient},
    error::AdapterError,
    http::{endpoint, AuthStrategy, ClientCredentials, CredentialStyle, VendorClient},
    transform::{assemble, first_present, format_dimensions, format_measure},
};

mod types;

pub use types::FedexTrackingPayload;
use types::{Address, ScanEvent, TrackResult};

pub struct FedexAdapter {
    config: CarrierConfig,
    http: reqwest::Client,
    tokens: Option<Arc<AccessTokenCache>>,
    proxy: Option<ProxyClient>,
}

impl FedexAdapter {
    pub fn new(
        config: CarrierConfig,
        http: reqwest::Client,
        tokens: Option<Arc<AccessTokenCache>>,
        context: ExecutionContext,
    ) -> Self {
        let proxy = match context {
            ExecutionContext::Direct => None,
            ExecutionContext::Proxied { base_url } => Some(ProxyClient::new(http.clone(), base_url)),
        };
        Self {
            config,
            http,
            tokens,
            proxy,
        }
    }

    fn vendor_client(&self) -> Result<VendorClient, AdapterError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| AdapterError::missing_credentials("FedEx API key"))?;
        let api_secret = self
            .config
            .api_secret()
            .ok_or_else(|| AdapterError::missing_credentials("FedEx API secret"))?;
        let token_url = endpoint(self.config.base_url(), &["oauth", "token"])?;

        Ok(VendorClient::new(
            CarrierId::Fedex,
            self.http.clone(),
            AuthStrategy::ClientCredentials(ClientCredentials::new(
                token_url,
                api_key,
                api_secret,
                CredentialStyle::FormFields,
            )),
            self.tokens.clone(),
        ))
    }

    async fn fetch_direct(&self, tracking_number: &str) -> Result<Value, AdapterError> {
        let client = self.vendor_client()?;
        let url = endpoint(self.config.base_url(), &["track", "v1", "trackingnumbers"])?;
        let body = json!({
            "includeDetailedScans": true,
            "trackingInfo": [{"trackingNumberInfo": {"trackingNumber": tracking_number}}]
        });
        client.send_json(client.http().post(url).json(&body)).await
    }
}

#[async_trait]
impl CarrierAdapter for FedexAdapter {
    fn carrier(&self) -> CarrierId {
        CarrierId::Fedex
    }

    async fn fetch_payload(&self, tracking_number: &str) -> Result<Value, AdapterError> {
        match &self.proxy {
            Some(proxy) => proxy.forward(CarrierId::Fedex, tracking_number).await,
            None => self.fetch_direct(tracking_number).await,
        }
    }

    fn transform(&self, payload: Value) -> Result<TrackingInfo, AdapterError> {
        transform_payload(payload)
    }
}

pub fn transform_payload(payload: Value) -> Result<TrackingInfo, AdapterError> {
    let payload: FedexTrackingPayload =
        serde_json::from_value(payload).map_err(|err| AdapterError::Decode(err.to_string()))?;
    let result = payload
        .output
        .and_then(|output| output.complete_track_results.into_iter().next())
        .and_then(|complete| complete.track_results.into_iter().next())
        .ok_or_else(|| AdapterError::NoData("no track results in FedEx response".to_string()))?;

    // FedEx reports unknown numbers inside a 200 body.
    if let Some(error) = &result.error {
        let message = first_present([error.message.as_ref(), error.code.as_ref()])
            .unwrap_or_else(|| "FedEx returned an error for this tracking number".to_string());
        return Err(AdapterError::NoData(message));
    }

    let events = result.scan_events.iter().map(to_event).collect();
    let fallback_status = result.latest_status_detail.as_ref().and_then(|detail| {
        first_present([detail.description.as_ref(), detail.status_by_locale.as_ref()])
    });
    let estimated_delivery = estimated_delivery(&result);
    let details = package_details(&result);

    Ok(assemble(events, fallback_status, estimated_delivery, details))
}

fn location_of(address: Option<&Address>) -> String {
    match address {
        Some(address) => format_location(
            address.city.as_deref(),
            address.state_or_province_code.as_deref(),
        ),
        None => UNKNOWN.to_string(),
    }
}

fn to_event(scan: &ScanEvent) -> TrackingEvent {
    let status = first_present([scan.derived_status.as_ref(), scan.event_description.as_ref()])
        .unwrap_or_else(|| UNKNOWN.to_string());
    let description = first_present([scan.event_description.as_ref(), scan.event_type.as_ref()])
        .unwrap_or_else(|| status.clone());

    TrackingEvent {
        status,
        location: location_of(scan.scan_location.as_ref()),
        timestamp: first_present([scan.date.as_ref()]),
        description,
    }
}

fn estimated_delivery(result: &TrackResult) -> Option<String> {
    let stamped = result
        .date_and_times
        .iter()
        .find(|entry| entry.kind.as_deref() == Some("ESTIMATED_DELIVERY"))
        .and_then(|entry| entry.date_time.as_ref());
    let window_end = result
        .estimated_delivery_time_window
        .as_ref()
        .and_then(|window| window.window.as_ref())
        .and_then(|window| window.ends.as_ref());
    first_present([stamped, window_end])
}

fn package_details(result: &TrackResult) -> PackageDetails {
    let measures = result
        .package_details
        .as_ref()
        .and_then(|detail| detail.weight_and_dimensions.as_ref());
    let party_location = |party: Option<&types::Party>| {
        party
            .and_then(|party| party.address.as_ref())
            .and_then(|address| {
                join_location(
                    address.city.as_deref(),
                    address.state_or_province_code.as_deref(),
                )
            })
    };

    PackageDetails {
        service: result
            .service_detail
            .as_ref()
            .and_then(|service| first_present([service.description.as_ref()])),
        weight: measures
            .and_then(|measures| measures.weight.first())
            .and_then(|weight| format_measure(weight.value.as_deref(), weight.unit.as_deref())),
        dimensions: measures
            .and_then(|measures| measures.dimensions.first())
            .and_then(|dimensions| {
                format_dimensions(
                    dimensions.length.as_deref(),
                    dimensions.width.as_deref(),
                    dimensions.height.as_deref(),
                    dimensions.units.as_deref(),
                )
            }),
        origin: party_location(result.shipper_information.as_ref()),
        destination: party_location(result.recipient_information.as_ref()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use shiptrack_domain::TrackerConfig;
    use wiremock::{
        matchers::{body_partial_json, body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::http::build_http_client;

    pub(crate) fn payload() -> Value {
        json!({
            "transactionId": "abc",
            "output": {
                "completeTrackResults": [{
                    "trackingNumber": "123456789012",
                    "trackResults": [{
                        "latestStatusDetail": {"code": "IT", "statusByLocale": "In transit", "description": "In transit"},
                        "scanEvents": [
                            {
                                "date": "2024-03-01T08:15:00-05:00",
                                "eventType": "PU",
                                "eventDescription": "Picked up",
                                "derivedStatus": "Picked up",
                                "scanLocation": {"city": "MEMPHIS", "stateOrProvinceCode": "TN", "countryCode": "US"}
                            },
                            {
                                "date": "2024-03-02T14:40:00-05:00",
                                "eventType": "AR",
                                "eventDescription": "Arrived at FedEx location",
                                "derivedStatus": "In transit",
                                "scanLocation": {"city": "INDIANAPOLIS", "stateOrProvinceCode": "IN", "countryCode": "US"}
                            }
                        ],
                        "dateAndTimes": [
                            {"type": "ACTUAL_PICKUP", "dateTime": "2024-03-01T08:15:00-05:00"},
                            {"type": "ESTIMATED_DELIVERY", "dateTime": "2024-03-04T20:00:00-05:00"}
                        ],
                        "packageDetails": {
                            "weightAndDimensions": {
                                "weight": [{"value": 2.5, "unit": "LB"}],
                                "dimensions": [{"length": 10, "width": 6, "height": 3, "units": "IN"}]
                            }
                        },
                        "serviceDetail": {"description": "FedEx Ground", "type": "FEDEX_GROUND"},
                        "shipperInformation": {"address": {"city": "MEMPHIS", "stateOrProvinceCode": "TN"}},
                        "recipientInformation": {"address": {"city": "CHICAGO", "stateOrProvinceCode": "IL"}}
                    }]
                }]
            }
        })
    }

    fn adapter(config: CarrierConfig) -> FedexAdapter {
        let http = build_http_client(&TrackerConfig::default()).unwrap();
        FedexAdapter::new(config, http, None, ExecutionContext::Direct)
    }

    #[test]
    fn scans_are_sorted_newest_first() {
        let info = transform_payload(payload()).unwrap();
        assert_eq!(info.status, "In transit");
        assert_eq!(info.location, "INDIANAPOLIS, IN");
        assert_eq!(info.last_update.as_deref(), Some("2024-03-02T14:40:00-05:00"));
        assert_eq!(info.events[1].description, "Picked up");
        assert_eq!(
            info.estimated_delivery.as_deref(),
            Some("2024-03-04T20:00:00-05:00")
        );

        let details = info.details.unwrap();
        assert_eq!(details.service.as_deref(), Some("FedEx Ground"));
        assert_eq!(details.weight.as_deref(), Some("2.5 LB"));
        assert_eq!(details.dimensions.as_deref(), Some("10x6x3 IN"));
        assert_eq!(details.origin.as_deref(), Some("MEMPHIS, TN"));
        assert_eq!(details.destination.as_deref(), Some("CHICAGO, IL"));
    }

    #[test]
    fn window_end_backs_up_estimated_delivery() {
        let info = transform_payload(json!({"output": {"completeTrackResults": [{
            "trackResults": [{
                "latestStatusDetail": {"description": "Label created"},
                "estimatedDeliveryTimeWindow": {"window": {"ends": "2024-03-06T18:00:00"}}
            }]
        }]}}))
        .unwrap();
        assert_eq!(info.status, "Label created");
        assert_eq!(info.estimated_delivery.as_deref(), Some("2024-03-06T18:00:00"));
        assert!(info.events.is_empty());
        assert_eq!(info.details, None);
    }

    #[test]
    fn in_body_error_is_no_data() {
        let err = transform_payload(json!({"output": {"completeTrackResults": [{
            "trackingNumber": "000000000000",
            "trackResults": [{"error": {
                "code": "TRACKING.TRACKINGNUMBER.NOTFOUND",
                "message": "Tracking number cannot be found. Please correct the tracking number and try again."
            }}]
        }]}}))
        .unwrap_err();
        assert_eq!(err.code(CarrierId::Fedex), "FEDEX_NO_DATA");
        assert!(err.to_string().starts_with("Tracking number cannot be found"));
    }

    #[test]
    fn missing_results_are_no_data() {
        let err = transform_payload(json!({"output": {"completeTrackResults": []}})).unwrap_err();
        assert_eq!(err.code(CarrierId::Fedex), "FEDEX_NO_DATA");
        let err = transform_payload(json!({})).unwrap_err();
        assert_eq!(err.code(CarrierId::Fedex), "FEDEX_NO_DATA");
    }

    #[tokio::test]
    async fn direct_lookup_posts_tracking_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "fx", "token_type": "bearer", "expires_in": 3599})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/track/v1/trackingnumbers"))
            .and(header("authorization", "Bearer fx"))
            .and(body_partial_json(json!({
                "includeDetailedScans": true,
                "trackingInfo": [{"trackingNumberInfo": {"trackingNumber": "123456789012"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&server)
            .await;

        let config = CarrierConfig::new(CarrierId::Fedex, server.uri())
            .unwrap()
            .with_credentials("key", "secret");
        let response = adapter(config).get_tracking_info("123456789012").await;
        assert!(response.success, "{response:?}");
        assert_eq!(response.data.unwrap().events.len(), 2);
    }

    #[tokio::test]
    async fn vendor_rejection_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fx"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/track/v1/trackingnumbers"))
            .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
            .mount(&server)
            .await;

        let config = CarrierConfig::new(CarrierId::Fedex, server.uri())
            .unwrap()
            .with_credentials("key", "secret");
        let response = adapter(config).get_tracking_info("123456789012").await;
        let error = response.error.unwrap();
        assert_eq!(error.code, "FEDEX_API_ERROR");
        assert!(error.message.contains("503"));
        assert!(error.message.contains("service unavailable"));
    }
}
