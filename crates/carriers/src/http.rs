//! Shared HTTP plumbing: one reqwest client per process, and a
//! [`VendorClient`] that applies a carrier's [`AuthStrategy`] before every
//! tracking call so adapters only describe their endpoints.

use std::{sync::Arc, time::Duration, time::Instant};

use metrics::{counter, histogram};
use reqwest::{header::ACCEPT, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use shiptrack_domain::{AccessTokenCache, CarrierId, TrackerConfig};
use tracing::{debug, warn};

use crate::{error::AdapterError, transform::lenient_u64};

/// Builds the process-wide HTTP client with the configured per-call timeout
/// and user agent.
pub fn build_http_client(config: &TrackerConfig) -> Result<reqwest::Client, AdapterError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent())
        .build()
        .map_err(|err| AdapterError::Config(format!("failed to build HTTP client: {err}")))
}

/// Joins path segments onto a vendor base URL, percent-encoding each one.
pub(crate) fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, AdapterError> {
    let mut url = Url::parse(base_url)
        .map_err(|err| AdapterError::Config(format!("invalid base URL `{base_url}`: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| AdapterError::Config(format!("base URL `{base_url}` cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// How client credentials travel in the token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStyle {
    /// HTTP basic auth, `grant_type` in the form body (UPS).
    BasicAuth,
    /// `client_id` / `client_secret` as form fields (FedEx).
    FormFields,
}

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    token_url: Url,
    client_id: String,
    client_secret: String,
    style: CredentialStyle,
    headers: Vec<(&'static str, String)>,
}

impl ClientCredentials {
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        style: CredentialStyle,
    ) -> Self {
        Self {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            style,
            headers: Vec::new(),
        }
    }

    /// Extra header sent with the token request only.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// How a carrier authenticates its tracking calls.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// OAuth2 client-credentials exchange, then `Authorization: Bearer`.
    ClientCredentials(ClientCredentials),
    /// Fixed key in a vendor header.
    StaticHeader { name: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    expires_in: Option<u64>,
}

/// Authenticated JSON client for one carrier.
#[derive(Debug, Clone)]
pub struct VendorClient {
    carrier: CarrierId,
    http: reqwest::Client,
    auth: Arc<AuthStrategy>,
    tokens: Option<Arc<AccessTokenCache>>,
}

impl VendorClient {
    pub fn new(
        carrier: CarrierId,
        http: reqwest::Client,
        auth: AuthStrategy,
        tokens: Option<Arc<AccessTokenCache>>,
    ) -> Self {
        Self {
            carrier,
            http,
            auth: Arc::new(auth),
            tokens,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Authenticates, sends, checks the status and parses the JSON body.
    pub async fn send_json(&self, request: RequestBuilder) -> Result<Value, AdapterError> {
        let request = self.authorize(request).await?;
        let started = Instant::now();
        let response = request.header(ACCEPT, "application/json").send().await?;
        histogram!("tracking_vendor_request_seconds", "carrier" => self.carrier.as_str())
            .record(started.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(carrier = %self.carrier, status = status.as_u16(), "vendor tracking call rejected");
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.forget_token();
            }
            return Err(AdapterError::api(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| AdapterError::Decode(err.to_string()))
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AdapterError> {
        match self.auth.as_ref() {
            AuthStrategy::ClientCredentials(credentials) => {
                let token = self.bearer_token(credentials).await?;
                Ok(request.bearer_auth(token))
            }
            AuthStrategy::StaticHeader { name, value } => Ok(request.header(*name, value)),
        }
    }

    async fn bearer_token(&self, credentials: &ClientCredentials) -> Result<String, AdapterError> {
        if let Some(cached) = self
            .tokens
            .as_ref()
            .and_then(|cache| cache.get(self.carrier, &credentials.client_id))
        {
            counter!("tracking_oauth_requests_total", "carrier" => self.carrier.as_str(), "result" => "cached")
                .increment(1);
            return Ok(cached.value().to_string());
        }

        let mut request = self
            .http
            .post(credentials.token_url.clone())
            .header(ACCEPT, "application/json");
        request = match credentials.style {
            CredentialStyle::BasicAuth => request
                .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
                .form(&[("grant_type", "client_credentials")]),
            CredentialStyle::FormFields => request.form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ]),
        };
        for (name, value) in &credentials.headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AdapterError::oauth(None, err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AdapterError::oauth(Some(status.as_u16()), err.to_string()))?;

        if !status.is_success() {
            counter!("tracking_oauth_requests_total", "carrier" => self.carrier.as_str(), "result" => "rejected")
                .increment(1);
            return Err(AdapterError::oauth(Some(status.as_u16()), body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|err| {
            AdapterError::oauth(Some(status.as_u16()), format!("unreadable token response: {err}"))
        })?;
        let token = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AdapterError::oauth(Some(status.as_u16()), "token response carried no access_token")
            })?;

        counter!("tracking_oauth_requests_total", "carrier" => self.carrier.as_str(), "result" => "issued")
            .increment(1);
        if let Some(cache) = &self.tokens {
            let cached = cache.insert(
                self.carrier,
                &credentials.client_id,
                token.clone(),
                parsed.expires_in.map(Duration::from_secs),
            );
            debug!(carrier = %self.carrier, cached, "obtained oauth token");
        }
        Ok(token)
    }

    fn forget_token(&self) {
        if let (AuthStrategy::ClientCredentials(credentials), Some(cache)) =
            (self.auth.as_ref(), &self.tokens)
        {
            cache.invalidate(self.carrier, &credentials.client_id);
        }
    }
}
