//! Credential error types.

use thiserror::Error;

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while acquiring a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential source produced a token.
    #[error("no Google Cloud credentials found: {0}")]
    NotFound(String),

    /// A credentials file could not be read.
    #[error("failed to read credentials file {path}: {message}")]
    ReadFailed { path: String, message: String },

    /// A credentials file was readable but not usable.
    #[error("invalid credentials file {path}: {message}")]
    InvalidFile { path: String, message: String },

    /// The OAuth token endpoint rejected the exchange or was unreachable.
    #[error("token endpoint error: {0}")]
    TokenEndpoint(String),

    /// The metadata server did not return a token.
    #[error("metadata server error: {0}")]
    Metadata(String),

    /// Signing the service account assertion failed.
    #[error("failed to sign service account assertion: {0}")]
    Signing(String),
}
