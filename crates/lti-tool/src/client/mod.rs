//! HTTP client for platform services.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff for transient failures
//! - Uniform status-code mapping into [`ClientError`]

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// Client used for every call the tool makes to a platform.
#[derive(Clone)]
pub struct PlatformClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,
}

impl PlatformClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("lti-tool/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client })
    }

    /// GET a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or invalid JSON.
    pub async fn get_json<T>(&self, url: &str, accept: &str, bearer: Option<&str>) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(url).header(ACCEPT, accept);
        let response = self.send(with_bearer(request, bearer)).await?;
        let value: serde_json::Value = response.json().await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// POST an `application/x-www-form-urlencoded` body and parse the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or invalid JSON.
    pub async fn post_form<T>(&self, url: &str, form: &[(&str, &str)]) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let body = serde_urlencoded::to_string(form)?;

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(body);

        let response = self.send(request).await?;
        let value: serde_json::Value = response.json().await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// POST a JSON body with a specific media type and return the raw reply text.
    ///
    /// Platforms answer score submissions with an empty body or arbitrary JSON,
    /// so the body is returned unparsed.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    pub async fn post_json(
        &self,
        url: &str,
        content_type: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> ClientResult<String> {
        let body_str = serde_json::to_string(body)?;

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body_str);

        let response = self.send(with_bearer(request, bearer)).await?;
        Ok(response.text().await?)
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = request.send().await?;
        handle_response(response).await
    }
}

fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
        None => request,
    }
}

/// Map platform status codes onto [`ClientError`].
async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), body = %text, "Platform request failed");

    if status.is_server_error() {
        Err(ClientError::server(status.as_u16(), text))
    } else {
        Err(ClientError::rejected(status.as_u16(), text))
    }
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient").finish()
    }
}
