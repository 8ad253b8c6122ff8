//! Error types for the LTI tool.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors from HTTP calls to the platform.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Form encoding error
    #[error("Failed to encode form: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// Platform rejected the request (4xx response)
    #[error("Platform rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
}

impl ClientError {
    /// Create a rejected-request error.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected { status, message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// HTTP status returned by the platform, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// LTI protocol validation failures.
#[derive(thiserror::Error, Debug)]
pub enum LtiError {
    /// Required request parameter missing
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// No registration for the issuer
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(String),

    /// Issuer known, client id not registered
    #[error("Client id {client_id} is not registered for issuer {issuer}")]
    UnknownClient {
        /// Platform issuer
        issuer: String,
        /// Client id from the request or token
        client_id: String,
    },

    /// OIDC state unknown, expired or already used
    #[error("State not found")]
    StateNotFound,

    /// OIDC state does not match the browser's state cookie
    #[error("State does not match")]
    StateMismatch,

    /// Nonce was not issued by this tool or has already been used
    #[error("Invalid nonce")]
    InvalidNonce,

    /// JWT could not be decoded or failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// Malformed JWT structure
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// No platform key matches the token
    #[error("No platform key found for kid {0:?}")]
    KeyNotFound(Option<String>),

    /// Platform key set could not be retrieved
    #[error("Failed to fetch platform key set: {0}")]
    KeySet(#[source] ClientError),

    /// Deployment id not registered
    #[error("Unable to find deployment: {0}")]
    UnknownDeployment(String),

    /// Required claim missing or invalid
    #[error("Invalid launch claims: {0}")]
    InvalidClaims(String),

    /// Message type not supported
    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(String),

    /// Configured URL unusable
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parse error
        message: String,
    },

    /// Outgoing message could not be signed
    #[error("Failed to sign message: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl LtiError {
    /// Create an invalid-claims error.
    #[must_use]
    pub fn claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims(message.into())
    }

    /// Whether the failure lies with the request rather than the tool or
    /// platform infrastructure.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        !matches!(self, Self::KeySet(_) | Self::Signing(_))
    }

    /// Create an invalid-URL error.
    #[must_use]
    pub fn url(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidUrl { url: url.into(), message: message.to_string() }
    }
}

/// Assignment & Grade Services failures.
#[derive(thiserror::Error, Debug)]
pub enum AgsError {
    /// Launch carries no AGS endpoint claim
    #[error("Assignment and Grade Services are not available for this launch")]
    Unavailable,

    /// Launch lacks a required AGS scope
    #[error("Missing AGS scope: {0}")]
    MissingScope(&'static str),

    /// No line item to post scores to
    #[error("No line item available for this launch")]
    NoLineItem,

    /// Line item URL unusable
    #[error("Invalid line item URL {0}")]
    InvalidLineItem(String),

    /// Platform call failed
    #[error("Platform error: {0}")]
    Client(#[from] ClientError),

    /// Client assertion could not be signed
    #[error("Failed to sign client assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Session storage failures.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// Filesystem error
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored session could not be (de)serialized
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session id not usable as a storage key
    #[error("Invalid session id")]
    InvalidId,
}

/// Configuration and key-material failures.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Environment variable holds an invalid value
    #[error("Invalid value for {var}: {message}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Explanation
        message: String,
    },

    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Tool configuration file is not valid JSON
    #[error("Failed to parse tool configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Key material unusable
    #[error("Invalid key {path}: {source}")]
    Key {
        /// Key file path
        path: PathBuf,
        /// Underlying error
        source: KeyError,
    },
}

impl ConfigError {
    /// Create an invalid-variable error.
    #[must_use]
    pub fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid { var, message: message.into() }
    }

    /// Create a key error.
    #[must_use]
    pub fn key(path: impl Into<PathBuf>, source: KeyError) -> Self {
        Self::Key { path: path.into(), source }
    }
}

/// RSA key material failures.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    /// Private key PEM could not be parsed
    #[error("unreadable private key: {0}")]
    Private(String),

    /// Public key PEM could not be parsed
    #[error("unreadable public key: {0}")]
    Public(String),

    /// Public key does not belong to the private key
    #[error("public key does not match private key")]
    Mismatch,

    /// PEM rejected by the signer
    #[error("unusable signing key: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// JSON error returned by API routes.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Human-readable message
    pub message: String,
    /// Underlying error text, only set outside production
    pub details: Option<String>,
}

impl ApiError {
    /// Create an error with the given status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Attach underlying error text when `expose` is set.
    #[must_use]
    pub fn with_details(mut self, expose: bool, details: impl ToString) -> Self {
        if expose {
            self.details = Some(details.to_string());
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.message });
        if let Some(details) = self.details {
            body["details"] = serde_json::Value::String(details);
        }
        (self.status, Json(body)).into_response()
    }
}

/// Result type alias for platform calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for protocol operations.
pub type LtiResult<T> = Result<T, LtiError>;
