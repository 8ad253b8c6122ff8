//! HTTP server for the LTI tool.
//!
//! Serves the OIDC login, launch, JWKS, configuration, status and grade
//! routes over axum.

pub mod grades;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use crate::config::Config;
use crate::lti::{LtiService, ToolConfig};
use routes::AppState;

/// The LTI tool HTTP server.
pub struct ToolServer {
    state: AppState,
}

impl ToolServer {
    /// Build the server: load registrations, open the session store and
    /// create the platform client.
    ///
    /// A missing tool configuration file is not fatal; the tool then starts
    /// with no registered platforms.
    ///
    /// # Errors
    ///
    /// Returns error if the tool configuration is invalid or the session
    /// store or HTTP client cannot be created.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let tool_config = if config.lti_config_path.exists() {
            ToolConfig::load(&config.lti_config_path)?
        } else {
            tracing::warn!(
                path = %config.lti_config_path.display(),
                "Tool configuration not found, no platforms registered"
            );
            ToolConfig::default()
        };

        Self::with_tool_config(config, tool_config)
    }

    /// Build the server around an already loaded tool configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the session store or HTTP client cannot be created.
    pub fn with_tool_config(config: Config, tool_config: ToolConfig) -> anyhow::Result<Self> {
        tracing::info!(registrations = tool_config.len(), "Loaded tool configuration");

        let sessions = Arc::from(session::build_store(&config)?);
        let lti = Arc::new(LtiService::new(&config, tool_config)?);
        let state = AppState::new(Arc::new(config), lti, sessions);

        Ok(Self { state })
    }

    /// The axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    /// Run the server until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error on server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!(
            base_url = %self.state.config.tool_base_url,
            "LTI tool listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for ToolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolServer")
            .field("base_url", &self.state.config.tool_base_url)
            .field("registrations", &self.state.lti.tool_config().len())
            .finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
