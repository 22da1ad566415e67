//! Where an adapter runs. `Direct` talks to the vendor itself; `Proxied`
//! forwards UPS/FedEx lookups to the server-side vendor routes and only runs
//! the transform locally, so OAuth secrets never leave the server.

use reqwest::{StatusCode, Url};
use shiptrack_domain::{CarrierId, ProxyEnvelope, TrackRequest, TrackerConfig};
use serde_json::Value;
use tracing::debug;

use crate::{error::AdapterError, http::endpoint};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecutionContext {
    #[default]
    Direct,
    Proxied { base_url: String },
}

impl ExecutionContext {
    pub fn from_config(config: &TrackerConfig) -> Self {
        match config.proxy_base_url() {
            Some(base_url) => Self::Proxied {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            None => Self::Direct,
        }
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self, Self::Proxied { .. })
    }
}

/// Client for `POST {base}/api/tracking/{vendor}`.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn route_url(&self, carrier: CarrierId) -> Result<Url, AdapterError> {
        endpoint(&self.base_url, &["api", "tracking", carrier.as_str()])
    }

    /// Forwards the lookup and returns the raw vendor payload.
    pub async fn forward(
        &self,
        carrier: CarrierId,
        tracking_number: &str,
    ) -> Result<Value, AdapterError> {
        let url = self.route_url(carrier)?;
        debug!(%carrier, %url, "forwarding lookup to tracking route");
        let response = self
            .http
            .post(url)
            .json(&TrackRequest::new(tracking_number))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<ProxyEnvelope>(&body) {
            Ok(ProxyEnvelope {
                success: true,
                data: Some(data),
                ..
            }) => Ok(data),
            Ok(ProxyEnvelope {
                error: Some(error), ..
            }) => Err(AdapterError::Remote(error)),
            Ok(_) if status.is_success() => Err(AdapterError::NoData(
                "tracking route returned no payload".to_string(),
            )),
            Ok(_) => Err(AdapterError::api(status.as_u16(), body)),
            Err(_) if status != StatusCode::OK => Err(AdapterError::api(status.as_u16(), body)),
            Err(err) => Err(AdapterError::Decode(err.to_string())),
        }
    }
}
