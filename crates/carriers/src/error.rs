//! Failure taxonomy inside an adapter. Nothing here crosses the adapter
//! boundary: [`AdapterError::into_carrier_error`] flattens every variant into
//! a vendor-scoped `{code, message}` pair.

use shiptrack_domain::{CarrierError, CarrierId};
use thiserror::Error;

/// Longest vendor body echoed back in an error message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0}")]
    Config(String),
    #[error("token request failed{}: {body}", .status.map(|s| format!(" with HTTP {s}")).unwrap_or_default())]
    OAuth { status: Option<u16>, body: String },
    #[error("tracking request failed with HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    NoData(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    /// Error already classified by the server-side route.
    #[error("{}", .0.message)]
    Remote(CarrierError),
}

impl AdapterError {
    pub fn missing_credentials(what: &str) -> Self {
        Self::Config(format!("{what} not configured"))
    }

    pub fn oauth(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::OAuth {
            status,
            body: truncate_body(body.into()),
        }
    }

    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: truncate_body(body.into()),
        }
    }

    pub fn code(&self, carrier: CarrierId) -> String {
        let prefix = carrier.code_prefix();
        match self {
            AdapterError::Config(_) => format!("{prefix}_CONFIG_ERROR"),
            AdapterError::OAuth { .. } => format!("{prefix}_OAUTH_ERROR"),
            AdapterError::Api { .. } => format!("{prefix}_API_ERROR"),
            AdapterError::NoData(_) => format!("{prefix}_NO_DATA"),
            AdapterError::Transport(_) | AdapterError::Decode(_) => {
                format!("{prefix}_SERVICE_ERROR")
            }
            AdapterError::Remote(error) => error.code.clone(),
        }
    }

    /// Vendor HTTP status behind the failure, when there was one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AdapterError::Api { status, .. } => Some(*status),
            AdapterError::OAuth { status, .. } => *status,
            _ => None,
        }
    }

    pub fn into_carrier_error(self, carrier: CarrierId) -> CarrierError {
        let code = self.code(carrier);
        match self {
            AdapterError::Remote(error) => error,
            other => CarrierError::new(code, format!("{}: {other}", carrier.display_name())),
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Transport("timed out waiting for vendor".to_string())
        } else if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("... (truncated)");
    }
    body
}
