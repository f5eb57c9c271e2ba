//! Catalog error types.

use thiserror::Error;

/// Result type for catalog listings.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from listing Discovery Engine apps or Vertex AI reasoning engines.
///
/// Messages are shown to operators as-is on the dashboard.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required argument was empty.
    #[error("{0}")]
    Invalid(String),

    /// No usable credentials.
    #[error(
        "Google Cloud Default Credentials not found. Please run 'gcloud auth application-default login'. ({0})"
    )]
    Credentials(String),

    /// The caller lacks the IAM permission.
    #[error("{0}")]
    PermissionDenied(String),

    /// Project, location or collection does not exist (or the API is off).
    #[error("{0}")]
    NotFound(String),

    /// Any other non-success answer.
    #[error("{0}")]
    Api(String),

    /// Transport or decoding failure.
    #[error("{0}")]
    Unexpected(String),
}

impl CatalogError {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}
