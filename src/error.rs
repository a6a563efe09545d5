//! Error types for the Gmail labeler.

use std::path::PathBuf;

/// Top-level error type for a labeling run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Malformed date: {0}")]
    MalformedDate(#[from] MalformedDateError),
}

/// Configuration-related errors, including unresolvable label names.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Unsupported config version {found:?}, expected {expected:?}")]
    UnsupportedVersion { found: String, expected: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Label '{name}' not found")]
    LabelNotFound { name: String },
}

/// Remote mail service failures. Every variant names the operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{operation} request failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },
}

/// Credential loading and refresh errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read credentials file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Failed to write credentials file {}: {reason}", .path.display())]
    Unwritable { path: PathBuf, reason: String },

    #[error("Token refresh rejected: {reason}")]
    RefreshFailed { reason: String },

    #[error("No client id/secret available for token refresh")]
    MissingClientSecrets,

    #[error(
        "No valid token in {} and no refresh token to renew it; \
         authorize the gmail.modify scope and save the user token there",
        .path.display()
    )]
    ConsentRequired { path: PathBuf },
}

/// A message's `Date` header was missing or could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum MalformedDateError {
    #[error("message {message_id} has no Date header")]
    Missing { message_id: String },

    #[error("message {message_id} has unparsable Date header {value:?}: {reason}")]
    Unparsable {
        message_id: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for the labeler.
pub type Result<T> = std::result::Result<T, Error>;
