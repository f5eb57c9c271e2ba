//! Google Cloud credential acquisition.
//!
//! Everything that calls a Google API asks a [`TokenProvider`] for a bearer
//! token right before the request.

mod adc;
mod error;
mod provider;

pub use adc::{
    ACCESS_TOKEN_ENV, AdcOptions, ApplicationDefault, CREDENTIALS_ENV, CredentialsFile,
    DEFAULT_METADATA_ENDPOINT, well_known_file,
};
pub use error::{AuthError, AuthResult};
pub use provider::{
    AuthorizedUser, AuthorizedUserKey, CLOUD_PLATFORM_SCOPE, DEFAULT_TOKEN_URI, MetadataServer,
    ServiceAccount, ServiceAccountKey, StaticToken, TokenProvider,
};
