//! LTI 1.3 protocol engine.
//!
//! [`LtiService`] owns the registrations, launch storage, platform key cache
//! and AGS client. Route handlers call it and map its errors to responses.

pub mod ags;
pub mod deep_link;
pub mod keys;
pub mod launch;
pub mod oidc;
pub mod platform_keys;
pub mod registration;
pub mod storage;

use std::sync::Arc;

pub use ags::AgsClient;
pub use deep_link::DeepLinkResponse;
pub use keys::{PublicJwk, PublicKeySet, ToolKey};
pub use launch::{LaunchRequest, MessageLaunch};
pub use oidc::{LoginRedirect, LoginRequest};
pub use platform_keys::PlatformKeys;
pub use registration::{Registration, ToolConfig};
pub use storage::{LaunchStore, PendingLogin};

use crate::client::PlatformClient;
use crate::config::Config;
use crate::error::{AgsError, ClientResult};
use crate::models::Score;

/// Entry point for login, launch, JWKS and grade passback.
#[derive(Debug)]
pub struct LtiService {
    tool_config: Arc<ToolConfig>,
    store: LaunchStore,
    platform_keys: PlatformKeys,
    ags: AgsClient,
    leeway: u64,
    launch_url: String,
}

impl LtiService {
    /// Create the service.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config, tool_config: ToolConfig) -> ClientResult<Self> {
        let client = PlatformClient::new(config)?;

        Ok(Self {
            tool_config: Arc::new(tool_config),
            store: LaunchStore::new(config.login_ttl, config.session_lifetime),
            platform_keys: PlatformKeys::new(client.clone(), config.jwks_cache_ttl),
            ags: AgsClient::new(client),
            leeway: config.clock_skew.as_secs(),
            launch_url: config.url_for("/launch"),
        })
    }

    /// Registered platforms.
    #[must_use]
    pub fn tool_config(&self) -> &ToolConfig {
        &self.tool_config
    }

    /// Tool public keys for `/jwks`.
    #[must_use]
    pub fn jwks(&self) -> PublicKeySet {
        self.tool_config.jwks()
    }

    /// Look up a validated launch by id.
    pub async fn find_launch(&self, launch_id: &str) -> Option<MessageLaunch> {
        self.store.get_launch(launch_id).await
    }

    /// Publish `score` for `launch` through AGS.
    ///
    /// # Errors
    ///
    /// Returns error if AGS is not granted or the platform call fails.
    pub async fn submit_score(&self, launch: &MessageLaunch, score: &Score) -> Result<(), AgsError> {
        self.ags.submit_score(launch, score).await
    }
}
