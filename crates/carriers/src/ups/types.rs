use serde::Deserialize;

use crate::transform::lenient_string;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsTrackingPayload {
    #[serde(default)]
    pub track_response: Option<TrackResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackResponse {
    #[serde(default)]
    pub shipment: Vec<Shipment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub package: Vec<Package>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub activity: Vec<Activity>,
    #[serde(default)]
    pub delivery_date: Vec<DeliveryDate>,
    #[serde(default)]
    pub current_status: Option<Status>,
    #[serde(default)]
    pub package_weight: Option<Weight>,
    #[serde(default)]
    pub dimension: Option<Dimension>,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub package_address: Vec<PackageAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub location: Option<ActivityLocation>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityLocation {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "stateProvince")]
    pub state_province_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryDate {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: Option<String>,
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    #[serde(default, deserialize_with = "lenient_string")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default)]
    pub unit_of_dimension: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PackageAddress {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}
