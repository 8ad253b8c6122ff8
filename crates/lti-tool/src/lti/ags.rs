//! Assignment & Grade Services: access tokens, line items and scores.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use url::Url;

use super::launch::MessageLaunch;
use super::registration::Registration;
use crate::client::PlatformClient;
use crate::error::AgsError;
use crate::models::claims::AgsClaim;
use crate::models::grade::{LineItem, Score};

/// AGS scopes.
pub mod scope {
    pub const LINE_ITEM: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem";
    pub const LINE_ITEM_READONLY: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem.readonly";
    pub const SCORE: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/score";
}

/// AGS media types.
pub mod media_type {
    pub const SCORE: &str = "application/vnd.ims.lis.v1.score+json";
    pub const LINE_ITEM: &str = "application/vnd.ims.lis.v2.lineitem+json";
    pub const LINE_ITEM_CONTAINER: &str = "application/vnd.ims.lis.v2.lineitemcontainer+json";
}

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime of a client assertion.
const ASSERTION_LIFETIME_SECS: i64 = 300;

/// Tokens are dropped this long before the platform says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Used when the token response has no `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Serialize)]
struct ClientAssertion<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    valid_until: Instant,
}

/// AGS client with a per-registration, per-scope token cache.
#[derive(Clone)]
pub struct AgsClient {
    client: PlatformClient,
    tokens: Cache<String, Arc<CachedToken>>,
}

impl AgsClient {
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        let tokens = Cache::builder().max_capacity(1_000).time_to_live(DEFAULT_TOKEN_LIFETIME).build();
        Self { client, tokens }
    }

    /// Publish `score` to the launch's line item.
    ///
    /// # Errors
    ///
    /// Returns error if the launch lacks AGS or the score scope, no line
    /// item can be resolved, or a platform call fails.
    pub async fn submit_score(&self, launch: &MessageLaunch, score: &Score) -> Result<(), AgsError> {
        let ags = launch.claims.ags.as_ref().ok_or(AgsError::Unavailable)?;
        if !ags.has_scope(scope::SCORE) {
            return Err(AgsError::MissingScope(scope::SCORE));
        }

        let line_item = self.resolve_line_item(launch, ags, score.score_maximum).await?;
        let scores_url = scores_url(&line_item)?;

        let token = self.access_token(&launch.registration, &[scope::SCORE]).await?;
        let body = serde_json::to_value(score).map_err(crate::error::ClientError::from)?;
        self.client
            .post_json(&scores_url, media_type::SCORE, &body, Some(&token))
            .await?;

        tracing::info!(
            user_id = %score.user_id,
            score = score.score_given,
            max_score = score.score_maximum,
            line_item = %line_item,
            "Score published"
        );
        Ok(())
    }

    /// Line item from the launch claim, else found or created in the
    /// line item container.
    async fn resolve_line_item(&self, launch: &MessageLaunch, ags: &AgsClaim, score_maximum: f64) -> Result<String, AgsError> {
        if let Some(line_item) = ags.lineitem.as_deref().filter(|l| !l.is_empty()) {
            return Ok(line_item.to_string());
        }

        let container = ags.lineitems.as_deref().ok_or(AgsError::NoLineItem)?;
        if !ags.has_scope(scope::LINE_ITEM) {
            return Err(AgsError::MissingScope(scope::LINE_ITEM));
        }

        let resource_link = launch.claims.resource_link.as_ref();
        let resource_link_id = resource_link.and_then(|l| l.id.clone());
        let token = self.access_token(&launch.registration, &[scope::LINE_ITEM]).await?;

        let existing: Vec<LineItem> = self
            .client
            .get_json(container, media_type::LINE_ITEM_CONTAINER, Some(&token))
            .await?;
        if let Some(id) = existing
            .into_iter()
            .find(|item| item.resource_link_id.is_some() && item.resource_link_id == resource_link_id)
            .and_then(|item| item.id)
        {
            return Ok(id);
        }

        let new_item = LineItem {
            id: None,
            score_maximum,
            label: resource_link
                .and_then(|l| l.title.clone())
                .unwrap_or_else(|| "Grade".to_string()),
            resource_link_id,
            resource_id: None,
            tag: Some("grade".to_string()),
        };
        let body = serde_json::to_value(&new_item).map_err(crate::error::ClientError::from)?;
        let reply = self
            .client
            .post_json(container, media_type::LINE_ITEM, &body, Some(&token))
            .await?;
        let created: LineItem = serde_json::from_str(&reply).map_err(crate::error::ClientError::from)?;

        tracing::info!(label = %new_item.label, "Created line item");
        created.id.ok_or(AgsError::NoLineItem)
    }

    /// Bearer token for `scopes`, from cache or a fresh client-credentials grant.
    async fn access_token(&self, registration: &Registration, scopes: &[&str]) -> Result<String, AgsError> {
        let scope = scopes.join(" ");
        let cache_key = format!("{}|{}|{}", registration.issuer, registration.client_id, scope);

        if let Some(token) = self.tokens.get(&cache_key).await {
            if Instant::now() < token.valid_until {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let assertion = registration.tool_key.sign(&ClientAssertion {
            iss: &registration.client_id,
            sub: &registration.client_id,
            aud: registration.token_audience(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            jti: format!("lti-service-token-{}", uuid::Uuid::new_v4()),
        })?;

        let response: TokenResponse = self
            .client
            .post_form(
                &registration.auth_token_url,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_assertion_type", CLIENT_ASSERTION_TYPE),
                    ("client_assertion", assertion.as_str()),
                    ("scope", scope.as_str()),
                ],
            )
            .await?;

        let lifetime = response.expires_in.map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        let token = CachedToken {
            value: response.access_token,
            valid_until: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        };
        let value = token.value.clone();
        self.tokens.insert(cache_key, Arc::new(token)).await;

        tracing::debug!(client_id = %registration.client_id, scope = %scope, "Obtained AGS access token");
        Ok(value)
    }
}

/// `<line item>/scores`, keeping any query string on the line item URL.
fn scores_url(line_item: &str) -> Result<String, AgsError> {
    let mut url = Url::parse(line_item).map_err(|_| AgsError::InvalidLineItem(line_item.to_string()))?;
    let path = format!("{}/scores", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url.into())
}

impl std::fmt::Debug for AgsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgsClient").field("cached_tokens", &self.tokens.entry_count()).finish()
    }
}
