//! Deep Linking response messages.

use serde_json::{Value, json};

use super::LtiService;
use super::launch::MessageLaunch;
use crate::error::{LtiError, LtiResult};
use crate::models::claims::{LTI_VERSION, claim, message_type};

/// Lifetime of a signed deep linking response.
const RESPONSE_LIFETIME_SECS: i64 = 600;

/// A signed response and where the browser must post it.
#[derive(Debug, Clone)]
pub struct DeepLinkResponse {
    pub return_url: String,
    pub jwt: String,
}

impl LtiService {
    /// Build a signed `LtiDeepLinkingResponse` offering one resource link
    /// that launches this tool.
    ///
    /// # Errors
    ///
    /// Returns error if the launch is not a deep linking request or signing fails.
    pub fn deep_link_response(&self, launch: &MessageLaunch, title: &str) -> LtiResult<DeepLinkResponse> {
        let settings = launch
            .claims
            .deep_linking_settings
            .as_ref()
            .filter(|_| launch.is_deep_link_launch())
            .ok_or_else(|| LtiError::UnsupportedMessageType(launch.claims.message_type.clone()))?;
        let return_url = settings
            .deep_link_return_url
            .clone()
            .ok_or_else(|| LtiError::claims("deep link return url is required"))?;

        let registration = &launch.registration;
        let now = chrono::Utc::now().timestamp();

        let mut claims = json!({
            "iss": registration.client_id,
            "aud": [registration.issuer],
            "iat": now,
            "exp": now + RESPONSE_LIFETIME_SECS,
            "nonce": format!("nonce-{}", uuid::Uuid::new_v4()),
            (claim::DEPLOYMENT_ID): launch.claims.deployment_id,
            (claim::MESSAGE_TYPE): message_type::DEEP_LINKING_RESPONSE,
            (claim::VERSION): LTI_VERSION,
            (claim::CONTENT_ITEMS): [{
                "type": "ltiResourceLink",
                "title": title,
                "url": self.launch_url,
            }],
        });
        if let Some(data) = &settings.data {
            claims[claim::DATA] = Value::String(data.clone());
        }

        let jwt = registration.tool_key.sign(&claims).map_err(LtiError::Signing)?;
        Ok(DeepLinkResponse { return_url, jwt })
    }
}
