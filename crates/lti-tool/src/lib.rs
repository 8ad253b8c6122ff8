//! Minimal LTI 1.3 Tool
//!
//! An LTI 1.3 tool endpoint for Learning Management Systems such as Open edX.
//! Accepts the OIDC third-party initiated login, validates the signed launch
//! token, extracts learner and course identity, and posts grades back through
//! Assignment & Grade Services (AGS).
//!
//! # Features
//!
//! - **OIDC login**: single-use state and nonce bound to the browser
//! - **Launch validation**: RS256 signatures against rotating platform JWKS
//!   with clock-skew tolerance
//! - **AGS**: client-credentials token grant and score publishing with retries
//! - **Deep linking**: signed `LtiDeepLinkingResponse` messages
//!
//! # Example
//!
//! ```no_run
//! use lti_tool::{config::Config, server::ToolServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = ToolServer::new(config)?;
//!     server.run_http(5000).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lti;
pub mod models;
pub mod server;

pub use client::PlatformClient;
pub use config::Config;
pub use error::{AgsError, ApiError, ClientError, ConfigError, KeyError, LtiError, SessionError};
pub use lti::LtiService;
pub use server::ToolServer;
