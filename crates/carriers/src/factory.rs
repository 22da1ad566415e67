//! Builds adapters from registry entries so callers never wire HTTP clients,
//! token caches or execution contexts by hand.

use std::sync::Arc;

use shiptrack_domain::{AccessTokenCache, CarrierConfig, CarrierId, CarrierRegistry, TrackerConfig};

use crate::{
    adapter::CarrierAdapter,
    context::ExecutionContext,
    dhl::DhlAdapter,
    error::AdapterError,
    fedex::FedexAdapter,
    http::build_http_client,
    ups::UpsAdapter,
};

/// Shares one HTTP client and one token cache across every adapter it builds.
#[derive(Debug, Clone)]
pub struct AdapterFactory {
    http: reqwest::Client,
    tokens: Option<Arc<AccessTokenCache>>,
    context: ExecutionContext,
}

impl AdapterFactory {
    pub fn new(config: &TrackerConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            http: build_http_client(config)?,
            tokens: config
                .token_cache_enabled()
                .then(|| Arc::new(AccessTokenCache::new())),
            context: ExecutionContext::from_config(config),
        })
    }

    /// Overrides the context derived from `TRACKING_PROXY_BASE_URL`.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn build(&self, config: CarrierConfig) -> Arc<dyn CarrierAdapter> {
        match config.id() {
            CarrierId::Ups => Arc::new(UpsAdapter::new(
                config,
                self.http.clone(),
                self.tokens.clone(),
                self.context.clone(),
            )),
            CarrierId::Fedex => Arc::new(FedexAdapter::new(
                config,
                self.http.clone(),
                self.tokens.clone(),
                self.context.clone(),
            )),
            CarrierId::Dhl => Arc::new(DhlAdapter::new(config, self.http.clone())),
        }
    }

    /// One adapter per registry entry, in registry order.
    pub fn build_all(&self, registry: &CarrierRegistry) -> Vec<Arc<dyn CarrierAdapter>> {
        registry.iter().cloned().map(|config| self.build(config)).collect()
    }
}
