use std::time::{Duration, Instant};

use moka::{sync::Cache, Expiry};

use crate::model::CarrierId;

/// Bearer token obtained from a client-credentials exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    ttl: Duration,
}

impl AccessToken {
    pub fn value(&self) -> &str {
        &self.value
    }
}

struct TokenExpiry;

impl Expiry<String, AccessToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &AccessToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// OAuth tokens keyed by carrier and client id. Each entry lives for the
/// vendor-stated lifetime minus [`AccessTokenCache::EXPIRY_MARGIN`].
pub struct AccessTokenCache {
    tokens: Cache<String, AccessToken>,
}

impl std::fmt::Debug for AccessTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCache")
            .field("entries", &self.tokens.entry_count())
            .finish()
    }
}

impl AccessTokenCache {
    pub const DEFAULT_CAPACITY: u64 = 64;
    pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
    /// Lifetime assumed when the vendor omits `expires_in`.
    pub const FALLBACK_LIFETIME: Duration = Duration::from_secs(30 * 60);

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            tokens: Cache::builder()
                .max_capacity(capacity.max(1))
                .expire_after(TokenExpiry)
                .build(),
        }
    }

    pub fn get(&self, carrier: CarrierId, client_id: &str) -> Option<AccessToken> {
        self.tokens.get(&cache_key(carrier, client_id))
    }

    /// Stores a token unless its remaining lifetime is inside the safety
    /// margin. Returns whether the token was cached.
    pub fn insert(
        &self,
        carrier: CarrierId,
        client_id: &str,
        token: impl Into<String>,
        expires_in: Option<Duration>,
    ) -> bool {
        let lifetime = expires_in.unwrap_or(Self::FALLBACK_LIFETIME);
        let ttl = lifetime.saturating_sub(Self::EXPIRY_MARGIN);
        if ttl.is_zero() {
            return false;
        }
        self.tokens.insert(
            cache_key(carrier, client_id),
            AccessToken {
                value: token.into(),
                ttl,
            },
        );
        true
    }

    pub fn invalidate(&self, carrier: CarrierId, client_id: &str) {
        self.tokens.invalidate(&cache_key(carrier, client_id));
    }
}

impl Default for AccessTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(carrier: CarrierId, client_id: &str) -> String {
    format!("{}:{}", carrier.as_ref(), client_id)
}
