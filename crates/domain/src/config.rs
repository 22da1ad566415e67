//! Environment-driven configuration structures shared by all binaries.

use std::{env, time::Duration};

use strum_macros::{AsRefStr, EnumString};
use thiserror::Error;

use crate::model::CarrierId;

/// Default per-call timeout applied to every vendor HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// API-specific configuration (HTTP listeners only) so the HTTP surface does
/// not depend on CLI-only environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_bind_address: String,
    api_unix_socket: Option<String>,
    internal_bind_address: Option<String>,
    internal_unix_socket: Option<String>,
}

impl ApiConfig {
    /// Loads only the environment variables required by the API binary.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            api_bind_address: get_required_var("API_BIND_ADDRESS")?,
            api_unix_socket: get_optional_var("API_UNIX_SOCKET"),
            internal_bind_address: get_optional_var("API_INTERNAL_BIND_ADDRESS"),
            internal_unix_socket: get_optional_var("API_INTERNAL_UNIX_SOCKET"),
        })
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_unix_socket(&self) -> Option<&str> {
        self.api_unix_socket.as_deref()
    }

    pub fn internal_bind_address(&self) -> Option<&str> {
        self.internal_bind_address.as_deref()
    }

    pub fn internal_unix_socket(&self) -> Option<&str> {
        self.internal_unix_socket.as_deref()
    }

    pub fn has_internal_listener(&self) -> bool {
        self.internal_bind_address.is_some() || self.internal_unix_socket.is_some()
    }
}

/// Vendor deployment a carrier talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

/// Raw per-carrier settings read from `<VENDOR>_*` variables. Credentials are
/// optional here; a carrier without them stays registered and reports a
/// configuration error when queried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierSettings {
    pub environment: Environment,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub billing_account_number: Option<String>,
    pub app_name: Option<String>,
}

impl CarrierSettings {
    /// Reads the settings for one carrier, e.g. `FEDEX_API_KEY`.
    pub fn load_from_env(carrier: CarrierId) -> Result<Self, ConfigError> {
        hydrate_env_file()?;
        let prefix = carrier.code_prefix();
        let var = |suffix: &str| get_optional_var(&format!("{prefix}_{suffix}"));

        let environment = match var("ENVIRONMENT") {
            Some(raw) => raw
                .parse::<Environment>()
                .map_err(|_| ConfigError::InvalidEnvironment {
                    key: format!("{prefix}_ENVIRONMENT"),
                    value: raw,
                })?,
            None => Environment::default(),
        };

        Ok(Self {
            environment,
            base_url: var("BASE_URL"),
            api_key: var("API_KEY"),
            api_secret: var("API_SECRET"),
            billing_account_number: var("BILLING_ACCOUNT_NUMBER"),
            app_name: var("APP_NAME"),
        })
    }
}

/// Knobs shared by every adapter: HTTP behaviour, execution context and
/// OAuth token caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    request_timeout: Duration,
    user_agent: String,
    proxy_base_url: Option<String>,
    token_cache_enabled: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: default_user_agent(),
            proxy_base_url: None,
            token_cache_enabled: true,
        }
    }
}

impl TrackerConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let request_timeout = match get_optional_var("TRACKING_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|source| ConfigError::InvalidNumber {
                    key: "TRACKING_REQUEST_TIMEOUT_SECS",
                    source,
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let token_cache_enabled = get_optional_var("TRACKING_TOKEN_CACHE")
            .map(|value| !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "off"))
            .unwrap_or(true);

        Ok(Self {
            request_timeout,
            user_agent: get_optional_var("TRACKING_USER_AGENT").unwrap_or_else(default_user_agent),
            proxy_base_url: get_optional_var("TRACKING_PROXY_BASE_URL"),
            token_cache_enabled,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn proxy_base_url(&self) -> Option<&str> {
        self.proxy_base_url.as_deref()
    }

    pub fn token_cache_enabled(&self) -> bool {
        self.token_cache_enabled
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_proxy_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.proxy_base_url = Some(base_url.into());
        self
    }

    pub fn with_token_cache(mut self, enabled: bool) -> Self {
        self.token_cache_enabled = enabled;
        self
    }
}

fn default_user_agent() -> String {
    format!("shiptrack/{}", env!("CARGO_PKG_VERSION"))
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

fn get_optional_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("SHIPTRACK_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid environment `{value}` in `{key}` (expected sandbox or production)")]
    InvalidEnvironment { key: String, value: String },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
