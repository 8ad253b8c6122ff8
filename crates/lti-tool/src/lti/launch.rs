//! Launch token validation.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use super::LtiService;
use super::registration::Registration;
use crate::error::{LtiError, LtiResult};
use crate::models::claims::{Audience, LTI_VERSION, LaunchClaims, message_type};

const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Form posted by the platform to `/launch`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchRequest {
    pub id_token: Option<String>,
    pub state: Option<String>,
}

/// A validated launch.
#[derive(Debug, Clone)]
pub struct MessageLaunch {
    pub launch_id: String,
    pub claims: Arc<LaunchClaims>,
    pub registration: Arc<Registration>,
}

impl MessageLaunch {
    #[must_use]
    pub fn is_resource_launch(&self) -> bool {
        self.claims.message_type == message_type::RESOURCE_LINK
    }

    #[must_use]
    pub fn is_deep_link_launch(&self) -> bool {
        self.claims.message_type == message_type::DEEP_LINKING
    }

    /// Whether the platform offers Assignment & Grade Services.
    #[must_use]
    pub fn has_ags(&self) -> bool {
        self.claims.ags.is_some()
    }

    /// Whether the platform offers Names & Role Provisioning Services.
    #[must_use]
    pub fn has_nrps(&self) -> bool {
        self.claims.nrps.is_some()
    }
}

/// Claims read before the signature is checked, to pick a registration.
#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    iss: String,
    #[serde(default)]
    aud: Audience,
    azp: Option<String>,
}

impl LtiService {
    /// Validate a launch and store it under a fresh launch id.
    ///
    /// `state_cookie` is the value of the browser's state cookie for the
    /// posted state, if present.
    ///
    /// # Errors
    ///
    /// Returns an [`LtiError`] describing the first failed check.
    pub async fn launch(&self, request: &LaunchRequest, state_cookie: Option<&str>) -> LtiResult<MessageLaunch> {
        let state = request.state.as_deref().filter(|s| !s.is_empty()).ok_or(LtiError::StateNotFound)?;
        let id_token = request
            .id_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(LtiError::MissingParameter("id_token"))?;

        match state_cookie {
            None => return Err(LtiError::StateNotFound),
            Some(cookie) if cookie != state => return Err(LtiError::StateMismatch),
            Some(_) => {}
        }
        let pending = self.store.take_login(state).await.ok_or(LtiError::StateNotFound)?;

        let header = jsonwebtoken::decode_header(id_token)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(LtiError::MalformedToken(format!("unsupported algorithm {:?}", header.alg)));
        }

        let peeked = peek_claims(id_token)?;
        if peeked.iss != pending.issuer {
            return Err(LtiError::claims("issuer does not match the login request"));
        }
        let client_id = match (&peeked.aud, peeked.azp.as_deref()) {
            (_, Some(azp)) => azp.to_string(),
            (aud, None) if aud.len() == 1 => aud.first().unwrap_or_default().to_string(),
            _ => return Err(LtiError::claims("azp is required when aud has several values")),
        };
        if client_id != pending.client_id {
            return Err(LtiError::claims("client id does not match the login request"));
        }
        let registration = self.tool_config.find_registration(&peeked.iss, Some(&client_id))?;

        let key = self.platform_keys.decoding_key(&registration, header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&registration.issuer]);
        validation.set_audience(&[&registration.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let claims = jsonwebtoken::decode::<LaunchClaims>(id_token, &key, &validation)?.claims;

        let now = chrono::Utc::now().timestamp();
        match claims.iat {
            Some(iat) if iat > now + self.leeway as i64 => {
                return Err(LtiError::claims("token issued in the future"));
            }
            Some(_) => {}
            None => return Err(LtiError::claims("missing iat")),
        }
        if claims.aud.len() > 1 && claims.azp.as_deref() != Some(registration.client_id.as_str()) {
            return Err(LtiError::claims("azp does not match client id"));
        }

        let nonce = claims.nonce.as_deref().ok_or(LtiError::InvalidNonce)?;
        if nonce != pending.nonce || !self.store.consume_nonce(nonce).await {
            return Err(LtiError::InvalidNonce);
        }

        if !registration.has_deployment(&claims.deployment_id) {
            return Err(LtiError::UnknownDeployment(claims.deployment_id.clone()));
        }

        validate_message(&claims)?;

        let launch = MessageLaunch {
            launch_id: format!("lti1p3-launch-{}", uuid::Uuid::new_v4()),
            claims: Arc::new(claims),
            registration,
        };
        self.store.save_launch(launch.clone()).await;

        tracing::info!(
            launch_id = %launch.launch_id,
            issuer = %launch.registration.issuer,
            message_type = %launch.claims.message_type,
            "Launch validated"
        );

        Ok(launch)
    }
}

fn peek_claims(token: &str) -> LtiResult<UnverifiedClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| LtiError::MalformedToken("expected three segments".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| LtiError::MalformedToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| LtiError::MalformedToken(e.to_string()))
}

fn validate_message(claims: &LaunchClaims) -> LtiResult<()> {
    if claims.version != LTI_VERSION {
        return Err(LtiError::claims(format!("unsupported LTI version '{}'", claims.version)));
    }

    match claims.message_type.as_str() {
        message_type::RESOURCE_LINK => {
            let has_link_id = claims.resource_link.as_ref().and_then(|l| l.id.as_deref()).is_some_and(|id| !id.is_empty());
            if !has_link_id {
                return Err(LtiError::claims("resource link id is required"));
            }
        }
        message_type::DEEP_LINKING => {
            let has_return_url = claims
                .deep_linking_settings
                .as_ref()
                .and_then(|s| s.deep_link_return_url.as_deref())
                .is_some_and(|url| !url.is_empty());
            if !has_return_url {
                return Err(LtiError::claims("deep link return url is required"));
            }
        }
        other => return Err(LtiError::UnsupportedMessageType(other.to_string())),
    }

    Ok(())
}
