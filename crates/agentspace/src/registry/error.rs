//! Agent registry error types.

use thiserror::Error;

use crate::auth::AuthError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// One or more required parameters were empty or absent. Lists all of them.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameter(Vec<&'static str>),

    /// No bearer token could be obtained.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Transport failure or non-success answer from the remote store.
    #[error("Request failed: {message}")]
    Request {
        message: String,
        status: Option<u16>,
    },

    /// The remote store answered with a body we could not parse.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// The read half of a read-modify-write failed.
    #[error("Could not retrieve agent details: {source}")]
    Dependent { source: Box<RegistryError> },
}

impl RegistryError {
    pub fn request(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Request {
            message: message.into(),
            status,
        }
    }

    /// Remote status code, when one was obtained.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            Self::Dependent { source } => source.status_code(),
            _ => None,
        }
    }

    /// Whether the remote store reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        let status = err.status().map(|s| s.as_u16());
        Self::Request {
            message: err.to_string(),
            status,
        }
    }
}
