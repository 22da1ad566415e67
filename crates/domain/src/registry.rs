//! Static carrier registry: display names, tracking-number formats, vendor
//! endpoints and credentials, loaded once at startup.

use regex::Regex;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::config::{CarrierSettings, ConfigError, Environment};
use crate::model::CarrierId;

/// UPS account settings that the other vendors do not need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsAccount {
    pub billing_account_number: Option<String>,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CarrierConfig {
    id: CarrierId,
    name: String,
    pattern: Regex,
    example: String,
    base_url: String,
    environment: Environment,
    api_key: Option<String>,
    api_secret: Option<String>,
    ups_account: Option<UpsAccount>,
}

impl CarrierConfig {
    /// Builds a config with the built-in name, pattern and example for the
    /// carrier. Fails if `pattern` is not anchored or does not compile.
    pub fn new(id: CarrierId, base_url: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_pattern(id, default_pattern(id), base_url)
    }

    pub fn with_pattern(
        id: CarrierId,
        pattern: &str,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        if !(pattern.starts_with('^') && pattern.ends_with('$')) {
            return Err(RegistryError::UnanchoredPattern {
                carrier: id,
                pattern: pattern.to_string(),
            });
        }
        // `^a|b$` only anchors the outer alternatives; regroup the body so
        // every alternative must match the whole number.
        let body = &pattern[1..pattern.len() - 1];
        let compiled = Regex::new(&format!("^(?:{body})$")).map_err(|source| RegistryError::InvalidPattern {
            carrier: id,
            source,
        })?;

        Ok(Self {
            id,
            name: id.display_name().to_string(),
            pattern: compiled,
            example: default_example(id).to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            environment: Environment::default(),
            api_key: None,
            api_secret: None,
            ups_account: (id == CarrierId::Ups).then(UpsAccount::default),
        })
    }

    /// Builds a config from `<VENDOR>_*` settings, choosing the base URL for
    /// the configured environment unless `<VENDOR>_BASE_URL` overrides it.
    pub fn from_settings(id: CarrierId, settings: CarrierSettings) -> Result<Self, RegistryError> {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(id, settings.environment).to_string());
        let mut config = Self::new(id, base_url)?;
        config.environment = settings.environment;
        config.api_key = settings.api_key;
        config.api_secret = settings.api_secret;
        if id == CarrierId::Ups {
            config.ups_account = Some(UpsAccount {
                billing_account_number: settings.billing_account_number,
                app_name: settings.app_name,
            });
        }
        Ok(config)
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_ups_account(mut self, account: UpsAccount) -> Self {
        self.ups_account = Some(account);
        self
    }

    pub fn id(&self) -> CarrierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }

    pub fn ups_account(&self) -> Option<&UpsAccount> {
        self.ups_account.as_ref()
    }

    pub fn matches(&self, tracking_number: &str) -> bool {
        self.pattern.is_match(tracking_number)
    }
}

/// Carrier configs in fixed priority order.
#[derive(Debug, Clone)]
pub struct CarrierRegistry {
    entries: Vec<CarrierConfig>,
}

impl CarrierRegistry {
    pub fn new(entries: Vec<CarrierConfig>) -> Result<Self, RegistryError> {
        let mut seen = Vec::with_capacity(entries.len());
        for entry in &entries {
            if seen.contains(&entry.id()) {
                return Err(RegistryError::DuplicateCarrier(entry.id()));
            }
            seen.push(entry.id());
        }
        Ok(Self { entries })
    }

    /// Loads every known carrier from the environment in registry order.
    pub fn from_env() -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        for id in CarrierId::iter() {
            let settings = CarrierSettings::load_from_env(id)?;
            entries.push(CarrierConfig::from_settings(id, settings)?);
        }
        Self::new(entries)
    }

    pub fn get(&self, carrier: CarrierId) -> Option<&CarrierConfig> {
        self.entries.iter().find(|entry| entry.id() == carrier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CarrierConfig> {
        self.entries.iter()
    }

    pub fn carriers(&self) -> impl Iterator<Item = CarrierId> + '_ {
        self.entries.iter().map(CarrierConfig::id)
    }

    pub fn validate_tracking_number(&self, carrier: CarrierId, tracking_number: &str) -> bool {
        self.get(carrier)
            .is_some_and(|entry| entry.matches(tracking_number))
    }

    pub fn carrier_example(&self, carrier: CarrierId) -> Option<&str> {
        self.get(carrier).map(CarrierConfig::example)
    }

    /// First carrier, in registry order, whose format matches.
    pub fn detect_carrier(&self, tracking_number: &str) -> Option<CarrierId> {
        self.entries
            .iter()
            .find(|entry| entry.matches(tracking_number))
            .map(CarrierConfig::id)
    }
}

pub fn default_pattern(carrier: CarrierId) -> &'static str {
    match carrier {
        CarrierId::Ups => r"^(1Z[0-9A-Z]{16}|\d{9}|T\d{10})$",
        CarrierId::Fedex => r"^(\d{12}|\d{15}|\d{22})$",
        CarrierId::Dhl => r"^\d{10,11}$",
    }
}

pub fn default_example(carrier: CarrierId) -> &'static str {
    match carrier {
        CarrierId::Ups => "1Z999AA10123456789",
        CarrierId::Fedex => "123456789012",
        CarrierId::Dhl => "1234567890",
    }
}

pub fn default_base_url(carrier: CarrierId, environment: Environment) -> &'static str {
    match (carrier, environment) {
        (CarrierId::Ups, Environment::Sandbox) => "https://wwwcie.ups.com",
        (CarrierId::Ups, Environment::Production) => "https://onlinetools.ups.com",
        (CarrierId::Fedex, Environment::Sandbox) => "https://apis-sandbox.fedex.com",
        (CarrierId::Fedex, Environment::Production) => "https://apis.fedex.com",
        (CarrierId::Dhl, Environment::Sandbox) => "https://api-test.dhl.com",
        (CarrierId::Dhl, Environment::Production) => "https://api-eu.dhl.com",
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tracking pattern for {carrier} must be anchored with ^…$: {pattern}")]
    UnanchoredPattern { carrier: CarrierId, pattern: String },
    #[error("tracking pattern for {carrier} does not compile: {source}")]
    InvalidPattern {
        carrier: CarrierId,
        #[source]
        source: regex::Error,
    },
    #[error("carrier {0} registered twice")]
    DuplicateCarrier(CarrierId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
