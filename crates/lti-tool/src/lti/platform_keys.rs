//! Platform signing keys.
//!
//! Inline key sets from the registration win. Otherwise the platform JWKS is
//! fetched and cached per URL; a token whose kid is not in the cached set
//! forces one refetch so key rotation is picked up without a restart.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use moka::future::Cache;

use super::registration::Registration;
use crate::client::PlatformClient;
use crate::error::{LtiError, LtiResult};

/// Cached platform key sets.
#[derive(Clone)]
pub struct PlatformKeys {
    client: PlatformClient,
    cache: Cache<String, Arc<JwkSet>>,
}

impl PlatformKeys {
    #[must_use]
    pub fn new(client: PlatformClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(256).time_to_live(ttl).build();
        Self { client, cache }
    }

    /// Resolve the key that signed a token from `registration`'s platform.
    ///
    /// # Errors
    ///
    /// Returns error if the key set cannot be fetched or holds no matching key.
    pub async fn decoding_key(&self, registration: &Registration, kid: Option<&str>) -> LtiResult<DecodingKey> {
        if let Some(set) = &registration.key_set {
            return select(set, kid);
        }

        let url = registration
            .key_set_url
            .as_deref()
            .ok_or_else(|| LtiError::KeyNotFound(kid.map(str::to_string)))?;

        if let Some(set) = self.cache.get(url).await {
            match select(&set, kid) {
                Ok(key) => return Ok(key),
                Err(LtiError::KeyNotFound(_)) => {
                    tracing::info!(url, kid = ?kid, "Unknown kid, refreshing platform key set");
                }
                Err(e) => return Err(e),
            }
        }

        let set = self.fetch(url).await?;
        select(&set, kid)
    }

    async fn fetch(&self, url: &str) -> LtiResult<Arc<JwkSet>> {
        let set: JwkSet = self
            .client
            .get_json(url, "application/json", None)
            .await
            .map_err(LtiError::KeySet)?;

        tracing::debug!(url, keys = set.keys.len(), "Fetched platform key set");

        let set = Arc::new(set);
        self.cache.insert(url.to_string(), Arc::clone(&set)).await;
        Ok(set)
    }
}

/// Pick the key for `kid`; a token without kid is accepted only against a
/// single-key set.
fn select(set: &JwkSet, kid: Option<&str>) -> LtiResult<DecodingKey> {
    let jwk = match kid {
        Some(kid) => set.find(kid),
        None if set.keys.len() == 1 => set.keys.first(),
        None => None,
    };

    let jwk = jwk.ok_or_else(|| LtiError::KeyNotFound(kid.map(str::to_string)))?;
    Ok(DecodingKey::from_jwk(jwk)?)
}

impl std::fmt::Debug for PlatformKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformKeys").field("cached_sets", &self.cache.entry_count()).finish()
    }
}
