//! Error types for the Kiraana gate.

use uuid::Uuid;

/// Top-level error type for the gate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Redemption error: {0}")]
    Redemption(#[from] RedemptionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the authentication collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Unexpected auth response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Failed to decode auth response: {0}")]
    Decode(String),
}

/// Errors from the remote table store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected store response ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to decode store row: {0}")]
    Decode(String),
}

/// Coupon redemption rejections and failures.
///
/// `EmptyCode`, `InvalidOrExpired` and `NoSession` are terminal, user-visible
/// rejections; the user may resubmit a different code. Collaborator failures
/// surface as `Auth`/`Store` and are reported as a generic failure with no
/// partial mutation.
#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("Coupon code is empty")]
    EmptyCode,

    #[error("Invalid or expired coupon code")]
    InvalidOrExpired,

    #[error("No active session")]
    NoSession,

    #[error("No subscription record for user {user_id}")]
    NoSubscription { user_id: Uuid },

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for the gate.
pub type Result<T> = std::result::Result<T, Error>;
