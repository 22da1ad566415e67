//! UPS Track API: OAuth client credentials over basic auth, then
//! `GET /api/track/v1/details/{inquiryNumber}`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use shiptrack_domain::{
    format_location, join_location, AccessTokenCache, CarrierConfig, CarrierId, PackageDetails,
    TrackingEvent, TrackingInfo, UNKNOWN,
};
use uuid::Uuid;

use crate::{
    adapter::CarrierAdapter,
    context::{ExecutionContext, ProxyClient},
    error::AdapterError,
    http::{endpoint, AuthStrategy, ClientCredentials, CredentialStyle, VendorClient},
    transform::{assemble, first_present, format_dimensions, format_measure},
};

mod types;

pub use types::UpsTrackingPayload;
use types::{Activity, Address, Package};

/// `transactionSrc` value when `UPS_APP_NAME` is unset.
const DEFAULT_TRANSACTION_SRC: &str = "shiptrack";

static UPS_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(\d{2})(\d{2})[T ]?(\d{2})(\d{2})(\d{2})$")
        .expect("UPS timestamp pattern is valid")
});

pub struct UpsAdapter {
    config: CarrierConfig,
    http: reqwest::Client,
    tokens: Option<Arc<AccessTokenCache>>,
    proxy: Option<ProxyClient>,
}

impl UpsAdapter {
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
            .ok_or_else(|| AdapterError::missing_credentials("UPS API key"))?;
        let api_secret = self
            .config
            .api_secret()
            .ok_or_else(|| AdapterError::missing_credentials("UPS API secret"))?;

        let token_url = endpoint(self.config.base_url(), &["security", "v1", "oauth", "token"])?;
        let mut credentials =
            ClientCredentials::new(token_url, api_key, api_secret, CredentialStyle::BasicAuth);
        if let Some(account) = self
            .config
            .ups_account()
            .and_then(|account| account.billing_account_number.as_deref())
        {
            credentials = credentials.with_header("x-merchant-id", account);
        }

        Ok(VendorClient::new(
            CarrierId::Ups,
            self.http.clone(),
            AuthStrategy::ClientCredentials(credentials),
            self.tokens.clone(),
        ))
    }

    fn transaction_src(&self) -> &str {
        self.config
            .ups_account()
            .and_then(|account| account.app_name.as_deref())
            .unwrap_or(DEFAULT_TRANSACTION_SRC)
    }

    async fn fetch_direct(&self, tracking_number: &str) -> Result<Value, AdapterError> {
        let client = self.vendor_client()?;
        let mut url = endpoint(
            self.config.base_url(),
            &["api", "track", "v1", "details", tracking_number],
        )?;
        url.query_pairs_mut()
            .append_pair("locale", "en_US")
            .append_pair("returnSignature", "false");

        let request = client
            .http()
            .get(url)
            .header("transId", Uuid::new_v4().simple().to_string())
            .header("transactionSrc", self.transaction_src());
        client.send_json(request).await
    }
}

#[async_trait]
impl CarrierAdapter for UpsAdapter {
    fn carrier(&self) -> CarrierId {
        CarrierId::Ups
    }

    async fn fetch_payload(&self, tracking_number: &str) -> Result<Value, AdapterError> {
        match &self.proxy {
            Some(proxy) => proxy.forward(CarrierId::Ups, tracking_number).await,
            None => self.fetch_direct(tracking_number).await,
        }
    }

    fn transform(&self, payload: Value) -> Result<TrackingInfo, AdapterError> {
        transform_payload(payload)
    }
}

pub fn transform_payload(payload: Value) -> Result<TrackingInfo, AdapterError> {
    let payload: UpsTrackingPayload =
        serde_json::from_value(payload).map_err(|err| AdapterError::Decode(err.to_string()))?;
    let shipment = payload
        .track_response
        .and_then(|response| response.shipment.into_iter().next())
        .ok_or_else(|| AdapterError::NoData("no shipment in UPS response".to_string()))?;

    let warning = shipment
        .warnings
        .iter()
        .find_map(|warning| warning.message.clone());
    let package = shipment.package.into_iter().next().ok_or_else(|| {
        AdapterError::NoData(warning.unwrap_or_else(|| "no package in UPS response".to_string()))
    })?;

    let events = package.activity.iter().map(to_event).collect();
    let fallback_status = package
        .current_status
        .as_ref()
        .and_then(|status| first_present([status.description.as_ref(), status.kind.as_ref()]));
    let estimated_delivery = estimated_delivery(&package);
    let details = package_details(&package);

    Ok(assemble(events, fallback_status, estimated_delivery, details))
}

/// Joins UPS `date` (`YYYYMMDD`) and `time` (`HHMMSS`) into
/// `YYYY-MM-DDTHH:MM:SS`. Anything else, including impossible calendar
/// values, yields `None`.
pub fn parse_ups_timestamp(date: Option<&str>, time: Option<&str>) -> Option<String> {
    let date = date.map(str::trim).filter(|d| !d.is_empty())?;
    let time = time.map(str::trim).unwrap_or("000000");
    // Numeric `time` values arrive with the leading zero dropped.
    let joined = if time.len() < 6 && time.bytes().all(|b| b.is_ascii_digit()) {
        format!("{date}{time:0>6}")
    } else {
        format!("{date}{time}")
    };
    let caps = UPS_TIMESTAMP.captures(&joined)?;
    let field = |index: usize| caps.get(index).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?
        .and_hms_opt(field(4)?, field(5)?, field(6)?)
        .map(|moment| moment.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// `YYYYMMDD` → `YYYY-MM-DD`.
fn parse_ups_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(
        raw[..4].parse().ok()?,
        raw[4..6].parse().ok()?,
        raw[6..].parse().ok()?,
    )
    .map(|date| date.format("%Y-%m-%d").to_string())
}

fn location_of(address: Option<&Address>) -> String {
    match address {
        Some(address) => format_location(
            address.city.as_deref(),
            address.state_province_code.as_deref(),
        ),
        None => UNKNOWN.to_string(),
    }
}

fn to_event(activity: &Activity) -> TrackingEvent {
    let status = activity.status.as_ref();
    let label = status
        .and_then(|status| first_present([status.description.as_ref(), status.kind.as_ref()]))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let description = status
        .and_then(|status| first_present([status.description.as_ref(), status.code.as_ref()]))
        .unwrap_or_else(|| label.clone());

    TrackingEvent {
        status: label,
        location: location_of(
            activity
                .location
                .as_ref()
                .and_then(|location| location.address.as_ref()),
        ),
        timestamp: parse_ups_timestamp(activity.date.as_deref(), activity.time.as_deref()),
        description,
    }
}

/// Scheduled or rescheduled delivery first, then whatever date UPS gave.
fn estimated_delivery(package: &Package) -> Option<String> {
    let preferred = package.delivery_date.iter().find(|entry| {
        matches!(entry.kind.as_deref(), Some("SDD") | Some("RDD"))
    });
    preferred
        .or_else(|| package.delivery_date.first())
        .and_then(|entry| entry.date.as_deref())
        .and_then(parse_ups_date)
}

fn package_details(package: &Package) -> PackageDetails {
    let address_of = |kind: &str| {
        package
            .package_address
            .iter()
            .find(|entry| entry.kind.as_deref() == Some(kind))
            .and_then(|entry| entry.address.as_ref())
            .and_then(|address| {
                join_location(
                    address.city.as_deref(),
                    address.state_province_code.as_deref(),
                )
            })
    };

    PackageDetails {
        service: package
            .service
            .as_ref()
            .and_then(|service| first_present([service.description.as_ref()])),
        weight: package.package_weight.as_ref().and_then(|weight| {
            format_measure(weight.weight.as_deref(), weight.unit_of_measurement.as_deref())
        }),
        dimensions: package.dimension.as_ref().and_then(|dimension| {
            format_dimensions(
                dimension.length.as_deref(),
                dimension.width.as_deref(),
                dimension.height.as_deref(),
                dimension.unit_of_dimension.as_deref(),
            )
        }),
        origin: address_of("ORIGIN"),
        destination: address_of("DESTINATION"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use shiptrack_domain::TrackerConfig;
    use wiremock::{
        matchers::{header, header_exists, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::http::build_http_client;

    pub(crate) fn activity(description: &str, city: &str, date: &str, time: &str) -> Value {
        json!({
            "location": {"address": {"city": city, "stateProvince": "KY", "countryCode": "US"}},
            "status": {"type": "I", "description": description, "code": "OR"},
            "date": date,
            "time": time
        })
    }

    pub(crate) fn payload(activities: Vec<Value>) -> Value {
        json!({
            "trackResponse": {
                "shipment": [{
                    "package": [{
                        "trackingNumber": "1Z999AA10123456789",
                        "activity": activities,
                        "deliveryDate": [{"type": "SDD", "date": "20240305"}],
                        "currentStatus": {"description": "On the Way", "code": "IT"},
                        "packageWeight": {"unitOfMeasurement": "LBS", "weight": "5.00"},
                        "dimension": {"length": "12", "width": "8", "height": "4", "unitOfDimension": "IN"},
                        "service": {"code": "003", "description": "UPS Ground"},
                        "packageAddress": [
                            {"type": "ORIGIN", "address": {"city": "Atlanta", "stateProvince": "GA"}},
                            {"type": "DESTINATION", "address": {"city": "Denver", "stateProvince": "CO"}}
                        ]
                    }]
                }]
            }
        })
    }

    /// One scan dated today and one dated yesterday, oldest first.
    pub(crate) fn today_and_yesterday() -> (Value, String) {
        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);
        let body = payload(vec![
            activity("Departed Facility", "Atlanta", &yesterday.format("%Y%m%d").to_string(), "120000"),
            activity("Arrived at Facility", "Louisville", &today.format("%Y%m%d").to_string(), "120000"),
        ]);
        (body, format!("{}T12:00:00", today.format("%Y-%m-%d")))
    }

    fn adapter(config: CarrierConfig, context: ExecutionContext) -> UpsAdapter {
        let http = build_http_client(&TrackerConfig::default()).unwrap();
        UpsAdapter::new(config, http, Some(Arc::new(AccessTokenCache::default())), context)
    }

    #[test]
    fn parses_ups_date_and_time() {
        assert_eq!(
            parse_ups_timestamp(Some("20240301"), Some("153045")).as_deref(),
            Some("2024-03-01T15:30:45")
        );
        assert_eq!(
            parse_ups_timestamp(Some("20240301T"), Some("153045")).as_deref(),
            Some("2024-03-01T15:30:45")
        );
        assert_eq!(
            parse_ups_timestamp(Some("20240301"), None).as_deref(),
            Some("2024-03-01T00:00:00")
        );
    }

    #[test]
    fn malformed_ups_timestamps_yield_none() {
        assert_eq!(parse_ups_timestamp(Some("2024031"), Some("153045")), None);
        assert_eq!(parse_ups_timestamp(Some("2024AB01"), Some("153045")), None);
        assert_eq!(parse_ups_timestamp(Some("20241301"), Some("153045")), None);
        assert_eq!(parse_ups_timestamp(Some("20240230"), Some("120000")), None);
        assert_eq!(parse_ups_timestamp(Some("20240301"), Some("256000")), None);
        assert_eq!(parse_ups_timestamp(None, Some("120000")), None);
    }

    #[test]
    fn newest_scan_drives_status() {
        let (body, today) = today_and_yesterday();
        let info = transform_payload(body).unwrap();
        assert_eq!(info.events.len(), 2);
        assert_eq!(info.events[0].timestamp.as_deref(), Some(today.as_str()));
        assert_eq!(info.status, "Arrived at Facility");
        assert_eq!(info.location, "Louisville, KY");
        assert_eq!(info.last_update.as_deref(), Some(today.as_str()));
        assert_eq!(info.estimated_delivery.as_deref(), Some("2024-03-05"));

        let details = info.details.unwrap();
        assert_eq!(details.service.as_deref(), Some("UPS Ground"));
        assert_eq!(details.weight.as_deref(), Some("5.00 LBS"));
        assert_eq!(details.dimensions.as_deref(), Some("12x8x4 IN"));
        assert_eq!(details.origin.as_deref(), Some("Atlanta, GA"));
        assert_eq!(details.destination.as_deref(), Some("Denver, CO"));
    }

    #[test]
    fn malformed_scans_sort_oldest() {
        let info = transform_payload(payload(vec![
            activity("Garbled", "Nowhere", "2024-03-01", "12:00"),
            activity("Origin Scan", "Atlanta", "20240301", "080000"),
            activity("Delivered", "Denver", "20240303", "101500"),
        ]))
        .unwrap();
        let order: Vec<_> = info.events.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(order, vec!["Delivered", "Origin Scan", "Garbled"]);
        assert_eq!(info.events[2].timestamp, None);
    }

    #[test]
    fn numeric_scan_fields_do_not_fail_the_payload() {
        let info = transform_payload(payload(vec![
            activity("Delivered", "Denver", "20240303", "101500"),
            json!({
                "location": {"address": {"city": "Atlanta"}},
                "status": {"description": "Origin Scan"},
                "date": 20240301,
                "time": 80000
            }),
            json!({
                "status": {"description": "Label Created"},
                "date": 2024,
                "time": true
            }),
        ]))
        .unwrap();
        let order: Vec<_> = info.events.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(order, vec!["Delivered", "Origin Scan", "Label Created"]);
        assert_eq!(info.events[1].timestamp.as_deref(), Some("2024-03-01T08:00:00"));
        assert_eq!(info.events[2].timestamp, None);
    }

    #[test]
    fn package_without_activity_uses_current_status() {
        let info = transform_payload(payload(vec![])).unwrap();
        assert_eq!(info.status, "On the Way");
        assert_eq!(info.location, UNKNOWN);
        assert_eq!(info.last_update, None);
    }

    #[test]
    fn missing_package_is_no_data() {
        let err = transform_payload(json!({"trackResponse": {"shipment": [{
            "package": [],
            "warnings": [{"code": "TW0001", "message": "Tracking Information Not Found"}]
        }]}}))
        .unwrap_err();
        assert_eq!(err.code(CarrierId::Ups), "UPS_NO_DATA");
        assert_eq!(err.to_string(), "Tracking Information Not Found");

        let err = transform_payload(json!({"response": {}})).unwrap_err();
        assert_eq!(err.code(CarrierId::Ups), "UPS_NO_DATA");
    }

    #[tokio::test]
    async fn direct_lookup_authenticates_then_tracks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security/v1/oauth/token"))
            .and(header_exists("authorization"))
            .and(header("x-merchant-id", "A1B2C3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "ups-token", "expires_in": "14399"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/track/v1/details/1Z999AA10123456789"))
            .and(query_param("locale", "en_US"))
            .and(header("authorization", "Bearer ups-token"))
            .and(header("transactionSrc", "shiptrack-test"))
            .and(header_exists("transId"))
            .respond_with(ResponseTemplate::new(200).set_body_json(today_and_yesterday().0))
            .expect(2)
            .mount(&server)
            .await;

        let config = CarrierConfig::new(CarrierId::Ups, server.uri())
            .unwrap()
            .with_credentials("key", "secret")
            .with_ups_account(shiptrack_domain::UpsAccount {
                billing_account_number: Some("A1B2C3".into()),
                app_name: Some("shiptrack-test".into()),
            });
        let adapter = adapter(config, ExecutionContext::Direct);

        for _ in 0..2 {
            let response = adapter.get_tracking_info("1Z999AA10123456789").await;
            assert!(response.success, "{response:?}");
            assert_eq!(response.data.unwrap().status, "Arrived at Facility");
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_network() {
        let server = MockServer::start().await;
        let config = CarrierConfig::new(CarrierId::Ups, server.uri()).unwrap();
        let response = adapter(config, ExecutionContext::Direct)
            .get_tracking_info("1Z999AA10123456789")
            .await;
        assert_eq!(response.error_code(), Some("UPS_CONFIG_ERROR"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn proxied_lookup_transforms_route_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tracking/ups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": today_and_yesterday().0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = CarrierConfig::new(CarrierId::Ups, "https://wwwcie.ups.com").unwrap();
        let adapter = adapter(
            config,
            ExecutionContext::Proxied {
                base_url: server.uri(),
            },
        );
        let response = adapter.get_tracking_info("1Z999AA10123456789").await;
        assert!(response.success, "{response:?}");
        assert_eq!(response.data.unwrap().events.len(), 2);
    }
}
