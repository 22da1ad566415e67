use serde::Deserialize;

use crate::transform::lenient_string;

#[derive(Debug, Default, Deserialize)]
pub struct FedexTrackingPayload {
    #[serde(default)]
    pub output: Option<Output>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(default)]
    pub complete_track_results: Vec<CompleteTrackResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTrackResult {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub track_results: Vec<TrackResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResult {
    #[serde(default)]
    pub latest_status_detail: Option<StatusDetail>,
    #[serde(default)]
    pub scan_events: Vec<ScanEvent>,
    #[serde(default)]
    pub date_and_times: Vec<DateAndTime>,
    #[serde(default)]
    pub estimated_delivery_time_window: Option<TimeWindow>,
    #[serde(default)]
    pub package_details: Option<PackageDetail>,
    #[serde(default)]
    pub service_detail: Option<ServiceDetail>,
    #[serde(default)]
    pub shipper_information: Option<Party>,
    #[serde(default)]
    pub recipient_information: Option<Party>,
    #[serde(default)]
    pub error: Option<TrackError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub status_by_locale: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scan_location: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_description: Option<String>,
    #[serde(default)]
    pub derived_status: Option<String>,
    #[serde(default)]
    pub scan_location: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_or_province_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAndTime {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub window: Option<Window>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Window {
    #[serde(default, deserialize_with = "lenient_string")]
    pub begins: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ends: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetail {
    #[serde(default)]
    pub weight_and_dimensions: Option<WeightAndDimensions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeightAndDimensions {
    #[serde(default)]
    pub weight: Vec<Weight>,
    #[serde(default)]
    pub dimensions: Vec<Dimensions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Weight {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Dimensions {
    #[serde(default, deserialize_with = "lenient_string")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceDetail {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Party {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
