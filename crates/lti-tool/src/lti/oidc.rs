//! OIDC third-party initiated login.

use serde::Deserialize;
use url::Url;

use super::LtiService;
use super::storage::PendingLogin;
use crate::error::{LtiError, LtiResult};

/// Login initiation parameters, from the query string or a form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub iss: Option<String>,
    pub login_hint: Option<String>,
    pub target_link_uri: Option<String>,
    pub lti_message_hint: Option<String>,
    pub client_id: Option<String>,
    pub lti_deployment_id: Option<String>,
}

/// Where to send the browser, and the state to bind to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub url: String,
    pub state: String,
}

impl LtiService {
    /// Start a login: record state and nonce and build the platform
    /// authentication redirect.
    ///
    /// # Errors
    ///
    /// Returns error if a required parameter is missing, the issuer is not
    /// registered or its login URL is invalid.
    pub async fn login(&self, request: &LoginRequest) -> LtiResult<LoginRedirect> {
        let issuer = non_empty(request.iss.as_deref()).ok_or(LtiError::MissingParameter("iss"))?;
        let login_hint =
            non_empty(request.login_hint.as_deref()).ok_or(LtiError::MissingParameter("login_hint"))?;

        let registration = self
            .tool_config
            .find_registration(issuer, non_empty(request.client_id.as_deref()))?;

        let target_link_uri = non_empty(request.target_link_uri.as_deref())
            .unwrap_or(&self.launch_url)
            .to_string();

        let state = format!("state-{}", uuid::Uuid::new_v4());
        let nonce = uuid::Uuid::new_v4().to_string();

        let mut url = Url::parse(&registration.auth_login_url)
            .map_err(|e| LtiError::url(&registration.auth_login_url, e))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("scope", "openid")
                .append_pair("response_type", "id_token")
                .append_pair("response_mode", "form_post")
                .append_pair("prompt", "none")
                .append_pair("client_id", &registration.client_id)
                .append_pair("redirect_uri", &target_link_uri)
                .append_pair("state", &state)
                .append_pair("nonce", &nonce)
                .append_pair("login_hint", login_hint);
            if let Some(hint) = non_empty(request.lti_message_hint.as_deref()) {
                query.append_pair("lti_message_hint", hint);
            }
        }

        tracing::info!(
            issuer,
            client_id = %registration.client_id,
            deployment_id = ?request.lti_deployment_id,
            "OIDC login initiated"
        );

        self.store
            .save_login(
                &state,
                PendingLogin {
                    nonce,
                    issuer: issuer.to_string(),
                    client_id: registration.client_id.clone(),
                },
            )
            .await;

        Ok(LoginRedirect { url: url.into(), state })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
