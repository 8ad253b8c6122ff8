//! Configuration for the LTI tool.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default values for every setting.
pub mod defaults {
    use std::time::Duration;

    /// Cookie signing secret used when `SECRET_KEY` is unset.
    pub const SECRET_KEY: &str = "dev-secret-key-change-in-production";

    /// Session cookie name.
    pub const SESSION_COOKIE_NAME: &str = "lti_session";

    /// Session lifetime (2 hours of inactivity).
    pub const SESSION_LIFETIME: Duration = Duration::from_secs(2 * 3600);

    /// Directory for the filesystem session backend.
    pub const SESSION_DIR: &str = "sessions";

    /// Tool display name.
    pub const TOOL_NAME: &str = "Minimal LTI 1.3 Tool";

    /// Tool description.
    pub const TOOL_DESCRIPTION: &str = "A minimal LTI 1.3 tool for OpenEdX";

    /// Tool version advertised in registration metadata.
    pub const TOOL_VERSION: &str = "1.0.0";

    /// Support contact advertised in registration metadata.
    pub const TOOL_SUPPORT_EMAIL: &str = "support@example.com";

    /// Externally reachable base URL of the tool.
    pub const TOOL_BASE_URL: &str = "http://localhost:5000";

    /// Base URL of the Open edX platform.
    pub const PLATFORM_BASE_URL: &str = "https://courses.edx.org";

    /// Tool configuration file (issuer -> registrations).
    pub const LTI_CONFIG_PATH: &str = "configs/lti_config.json";

    /// Leeway applied to `exp`, `iat` and `nbf`.
    pub const CLOCK_SKEW: Duration = Duration::from_secs(60);

    /// Lifetime of a pending OIDC login (state + nonce).
    pub const LOGIN_TTL: Duration = Duration::from_secs(600);

    /// How long fetched platform key sets are trusted before refetching.
    pub const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Maximum request body size (16 MiB).
    pub const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

    /// Request timeout for platform calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout for platform calls.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Retries for transient platform failures.
    pub const MAX_RETRIES: u32 = 3;
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "testing" | "test" => Ok(Self::Testing),
            other => Err(ConfigError::invalid("APP_ENV", format!("unknown environment '{other}'"))),
        }
    }
}

/// Where HTTP session records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    /// In-process cache, lost on restart.
    Memory,
    /// One JSON file per session in the given directory.
    Filesystem(PathBuf),
}

/// Tool configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign cookies.
    pub secret_key: String,

    /// Deployment environment.
    pub environment: Environment,

    /// Session storage backend.
    pub session_backend: SessionBackend,

    /// Session cookie name.
    pub session_cookie_name: String,

    /// Whether cookies carry the `Secure` attribute.
    pub session_cookie_secure: bool,

    /// Optional cookie domain.
    pub session_cookie_domain: Option<String>,

    /// Session lifetime.
    pub session_lifetime: Duration,

    /// Tool display name.
    pub tool_name: String,

    /// Tool description.
    pub tool_description: String,

    /// Tool version.
    pub tool_version: String,

    /// Support contact email.
    pub tool_support_email: String,

    /// Externally reachable base URL of the tool (no trailing slash).
    pub tool_base_url: String,

    /// Base URL of the platform.
    pub platform_base_url: String,

    /// Path of the tool configuration file.
    pub lti_config_path: PathBuf,

    /// Leeway for JWT time claims.
    pub clock_skew: Duration,

    /// Lifetime of a pending OIDC login.
    pub login_ttl: Duration,

    /// Platform key set cache TTL.
    pub jwks_cache_ttl: Duration,

    /// Maximum request body size.
    pub max_content_length: usize,

    /// Request timeout for platform calls.
    pub request_timeout: Duration,

    /// Connection timeout for platform calls.
    pub connect_timeout: Duration,

    /// Retries for transient platform failures.
    pub max_retries: u32,
}

impl Config {
    /// Create a development configuration for the given tool base URL.
    #[must_use]
    pub fn new(tool_base_url: impl Into<String>) -> Self {
        Self {
            secret_key: defaults::SECRET_KEY.to_string(),
            environment: Environment::Development,
            session_backend: SessionBackend::Memory,
            session_cookie_name: defaults::SESSION_COOKIE_NAME.to_string(),
            session_cookie_secure: false,
            session_cookie_domain: None,
            session_lifetime: defaults::SESSION_LIFETIME,
            tool_name: defaults::TOOL_NAME.to_string(),
            tool_description: defaults::TOOL_DESCRIPTION.to_string(),
            tool_version: defaults::TOOL_VERSION.to_string(),
            tool_support_email: defaults::TOOL_SUPPORT_EMAIL.to_string(),
            tool_base_url: trim_base_url(tool_base_url.into()),
            platform_base_url: defaults::PLATFORM_BASE_URL.to_string(),
            lti_config_path: PathBuf::from(defaults::LTI_CONFIG_PATH),
            clock_skew: defaults::CLOCK_SKEW,
            login_ttl: defaults::LOGIN_TTL,
            jwks_cache_ttl: defaults::JWKS_CACHE_TTL,
            max_content_length: defaults::MAX_CONTENT_LENGTH,
            request_timeout: defaults::REQUEST_TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
            max_retries: defaults::MAX_RETRIES,
        }
    }

    /// Create a test configuration with short timeouts and no retries.
    #[must_use]
    pub fn for_testing(tool_base_url: &str) -> Self {
        Self {
            environment: Environment::Testing,
            secret_key: "test-secret-key-for-cookie-signing".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_retries: 0,
            ..Self::new(tool_base_url)
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = var("TOOL_BASE_URL").unwrap_or_else(|| defaults::TOOL_BASE_URL.to_string());
        let mut config = Self::new(base_url);

        if let Some(secret) = var("SECRET_KEY") {
            config.secret_key = secret;
        }
        if let Some(env) = var("APP_ENV") {
            config.environment = Environment::parse(&env)?;
        }

        let session_dir = var("SESSION_DIR").unwrap_or_else(|| defaults::SESSION_DIR.to_string());
        config.session_backend = match var("SESSION_TYPE").as_deref() {
            None | Some("memory") => SessionBackend::Memory,
            Some("filesystem") => SessionBackend::Filesystem(PathBuf::from(session_dir)),
            Some(other) => {
                return Err(ConfigError::invalid(
                    "SESSION_TYPE",
                    format!("unsupported session backend '{other}' (expected memory or filesystem)"),
                ));
            }
        };

        if let Some(secure) = var("SESSION_COOKIE_SECURE") {
            config.session_cookie_secure = parse_flag(&secure);
        }
        config.session_cookie_domain = var("SESSION_COOKIE_DOMAIN");

        if let Some(name) = var("TOOL_NAME") {
            config.tool_name = name;
        }
        if let Some(description) = var("TOOL_DESCRIPTION") {
            config.tool_description = description;
        }
        if let Some(email) = var("TOOL_SUPPORT_EMAIL") {
            config.tool_support_email = email;
        }
        if let Some(url) = var("PLATFORM_BASE_URL") {
            config.platform_base_url = trim_base_url(url);
        }
        if let Some(path) = var("LTI_CONFIG_PATH") {
            config.lti_config_path = PathBuf::from(path);
        }
        if let Some(skew) = var("LTI_CLOCK_SKEW_SECS") {
            let secs: u64 = skew.trim().parse().map_err(|_| {
                ConfigError::invalid("LTI_CLOCK_SKEW_SECS", format!("'{skew}' is not a number of seconds"))
            })?;
            config.clock_skew = Duration::from_secs(secs);
        }

        // Production always serves over HTTPS.
        if config.environment == Environment::Production {
            config.session_cookie_secure = true;
        }

        Ok(config)
    }

    /// Whether error responses may include underlying error text.
    #[must_use]
    pub fn expose_error_details(&self) -> bool {
        self.environment != Environment::Production
    }

    /// Build an absolute URL for a tool route.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.tool_base_url, path)
    }

    /// Name of the cookie binding an OIDC state to the browser.
    #[must_use]
    pub fn state_cookie_name(state: &str) -> String {
        format!("lti1p3-state-{state}")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(defaults::TOOL_BASE_URL)
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
