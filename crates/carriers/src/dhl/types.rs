use serde::Deserialize;

use crate::transform::lenient_string;

#[derive(Debug, Default, Deserialize)]
pub struct DhlTrackingPayload {
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub status: Option<Event>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estimated_time_of_delivery: Option<String>,
    #[serde(default)]
    pub origin: Option<Place>,
    #[serde(default)]
    pub destination: Option<Place>,
    #[serde(default)]
    pub details: Option<Details>,
}

/// Shape shared by `shipments[].status` and `shipments[].events[]`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub location: Option<Place>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub address_locality: Option<String>,
    #[serde(default)]
    pub address_region: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Details {
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub weight: Option<Measure>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub product_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub unit_text: Option<String>,
}

/// DHL sends the three sides as bare numbers with one separate `unit`.
#[derive(Debug, Default, Deserialize)]
pub struct Dimensions {
    #[serde(default, deserialize_with = "lenient_string")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}
