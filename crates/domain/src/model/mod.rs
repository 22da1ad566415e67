//! Unified tracking model shared by the carrier adapters, the aggregator and
//! the HTTP surface.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Location label used when a vendor reports neither city nor region.
pub const UNKNOWN: &str = "Unknown";

/// Identifier of a supported carrier. Declaration order is the registry
/// priority order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CarrierId {
    Ups,
    Fedex,
    Dhl,
}

impl CarrierId {
    pub fn as_str(self) -> &'static str {
        match self {
            CarrierId::Ups => "ups",
            CarrierId::Fedex => "fedex",
            CarrierId::Dhl => "dhl",
        }
    }

    /// Upper-case prefix used in vendor-scoped error codes (`UPS_NO_DATA`).
    pub fn code_prefix(self) -> &'static str {
        match self {
            CarrierId::Ups => "UPS",
            CarrierId::Fedex => "FEDEX",
            CarrierId::Dhl => "DHL",
        }
    }

    /// Human readable vendor label.
    pub fn display_name(self) -> &'static str {
        match self {
            CarrierId::Ups => "UPS",
            CarrierId::Fedex => "FedEx",
            CarrierId::Dhl => "DHL",
        }
    }
}

/// A single vendor-reported checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    pub location: String,
    pub timestamp: Option<String>,
    pub description: String,
}

/// Package metadata; every field is independently optional and only filled
/// from what the vendor actually returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl PackageDetails {
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.weight.is_none()
            && self.dimensions.is_none()
            && self.origin.is_none()
            && self.destination.is_none()
    }

    /// Returns `None` when the vendor exposed no metadata at all.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Normalized tracking result. `events` is always ordered newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub status: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    pub last_update: Option<String>,
    pub events: Vec<TrackingEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<PackageDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierError {
    pub code: String,
    pub message: String,
}

impl CarrierError {
    pub const NO_CARRIER_FOUND: &'static str = "NO_CARRIER_FOUND";
    pub const UNKNOWN_ERROR: &'static str = "UNKNOWN_ERROR";
    pub const INVALID_TRACKING_NUMBER: &'static str = "INVALID_TRACKING_NUMBER";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result envelope returned by adapters and the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TrackingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CarrierError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<CarrierId>,
}

impl CarrierResponse {
    pub fn success(data: TrackingInfo) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            carrier: None,
        }
    }

    pub fn failure(error: CarrierError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            carrier: None,
        }
    }

    pub fn with_carrier(mut self, carrier: CarrierId) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|err| err.code.as_str())
    }
}

impl From<Result<TrackingInfo, CarrierError>> for CarrierResponse {
    fn from(value: Result<TrackingInfo, CarrierError>) -> Self {
        match value {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}

/// Body returned by the server-side vendor routes. `data` carries the raw
/// vendor payload; the calling adapter runs the transform itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CarrierError>,
}

impl ProxyEnvelope {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: CarrierError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Request body accepted by every tracking route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(default)]
    pub tracking_number: Option<String>,
}

impl TrackRequest {
    pub fn new(tracking_number: impl Into<String>) -> Self {
        Self {
            tracking_number: Some(tracking_number.into()),
        }
    }
}

/// Strips whitespace and upper-cases a user supplied tracking number.
/// Returns `None` when nothing is left.
pub fn normalize_tracking_number(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Formats a location as `"City, Region"`, falling back to whichever part is
/// present and finally to `"Unknown"`.
pub fn format_location(city: Option<&str>, region: Option<&str>) -> String {
    join_location(city, region).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Same as [`format_location`] but yields `None` instead of `"Unknown"`, for
/// optional fields such as origin/destination.
pub fn join_location(city: Option<&str>, region: Option<&str>) -> Option<String> {
    let city = city.map(str::trim).filter(|value| !value.is_empty());
    let region = region.map(str::trim).filter(|value| !value.is_empty());
    match (city, region) {
        (Some(city), Some(region)) => Some(format!("{city}, {region}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}
