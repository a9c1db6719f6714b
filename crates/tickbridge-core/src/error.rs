//! Core error types for tickbridge-core.
//!
//! This module defines the error hierarchy using thiserror. The
//! distinction that matters operationally is auth vs transient: auth
//! failures need user action and are never retried automatically, while
//! transient failures are retried on the next poll tick.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tickbridge-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// OAuth-related errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Command input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors from the TickTick open API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The access token was rejected. User-actionable; not retried.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The service asked us to slow down.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure (connect error, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying on the next poll tick is reasonable.
    /// Rate limits, 5xx responses, and transport failures qualify;
    /// auth rejections and 4xx responses do not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Auth(_) | ApiError::Decode(_) => false,
        }
    }

    /// Whether this failure requires the user to re-authorize.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

/// OAuth-specific errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// Access token expired
    #[error("Access token expired and no refresh token available")]
    TokenExpired,

    /// Not authenticated
    #[error("Not authenticated with TickTick")]
    NotAuthenticated,

    /// Client credentials not configured
    #[error("OAuth client credentials not configured")]
    CredentialsNotConfigured,

    /// Credential store failure
    #[error("credential store error: {0}")]
    Keyring(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No usable configuration directory on this platform
    #[error("No configuration directory available")]
    NoConfigDir,
}

/// Command input validation errors. Rejected synchronously, before any
/// request is sent to the remote API.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or absent
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// Invalid value
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ApiError::RateLimited.is_transient());
        assert!(ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ApiError::Status {
            status: 404,
            body: String::new()
        }
        .is_transient());
        assert!(!ApiError::Auth("revoked".into()).is_transient());
    }

    #[test]
    fn auth_classification() {
        assert!(ApiError::Auth("expired".into()).is_auth());
        assert!(!ApiError::RateLimited.is_auth());
    }
}
