//! Application Default Credentials discovery.
//!
//! Resolution order: explicit access token, `GOOGLE_APPLICATION_CREDENTIALS`,
//! the gcloud well-known file, then the metadata server. Discovery runs on
//! every token request so a credentials file written after startup is picked
//! up without a restart.

use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::error::{AuthError, AuthResult};
use super::provider::{
    AuthorizedUser, AuthorizedUserKey, MetadataServer, ServiceAccount, ServiceAccountKey,
    StaticToken, TokenProvider,
};

/// Environment variable naming a credentials JSON file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable carrying a ready-made access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Default metadata server base URL.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

/// A parsed credentials file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    AuthorizedUser(AuthorizedUserKey),
    ServiceAccount(ServiceAccountKey),
}

impl CredentialsFile {
    /// Read and parse a credentials file.
    pub fn load(path: &Path) -> AuthResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AuthError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> AuthResult<Self> {
        serde_json::from_str(contents).map_err(|e| AuthError::InvalidFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Project the file belongs to, when it says.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::AuthorizedUser(key) => key.quota_project_id.as_deref(),
            Self::ServiceAccount(key) => key.project_id.as_deref(),
        }
    }

    fn into_provider(self, client: Client) -> Box<dyn TokenProvider> {
        match self {
            Self::AuthorizedUser(key) => Box::new(AuthorizedUser::new(client, key)),
            Self::ServiceAccount(key) => Box::new(ServiceAccount::new(client, key)),
        }
    }
}

/// Location of the file written by `gcloud auth application-default login`.
pub fn well_known_file() -> Option<PathBuf> {
    if let Some(dir) = env::var_os("CLOUDSDK_CONFIG").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir).join("application_default_credentials.json"));
    }
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("gcloud")
            .join("application_default_credentials.json")
    })
}

/// Inputs to credential discovery.
#[derive(Debug, Clone)]
pub struct AdcOptions {
    /// Token configured explicitly; wins over everything else.
    pub access_token: Option<String>,
    /// Credentials file configured explicitly; wins over the environment.
    pub credentials_file: Option<PathBuf>,
    /// Metadata server base URL.
    pub metadata_endpoint: String,
}

impl Default for AdcOptions {
    fn default() -> Self {
        Self {
            access_token: None,
            credentials_file: None,
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
        }
    }
}

/// Token provider that resolves Application Default Credentials per call.
#[derive(Debug, Clone)]
pub struct ApplicationDefault {
    client: Client,
    options: AdcOptions,
}

impl ApplicationDefault {
    pub fn new(client: Client, options: AdcOptions) -> Self {
        Self { client, options }
    }

    fn explicit_token(&self) -> Option<String> {
        self.options
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    fn credentials_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.options.credentials_file {
            return Some(path.clone());
        }
        if let Some(path) = env::var_os(CREDENTIALS_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(path));
        }
        well_known_file().filter(|p| p.is_file())
    }

    /// Pick the provider for this call.
    fn resolve(&self) -> AuthResult<Box<dyn TokenProvider>> {
        if let Some(token) = self.explicit_token() {
            return Ok(Box::new(StaticToken::new(token)));
        }
        if let Some(path) = self.credentials_path() {
            debug!(path = %path.display(), "using credentials file");
            return Ok(CredentialsFile::load(&path)?.into_provider(self.client.clone()));
        }
        Ok(Box::new(MetadataServer::new(
            self.client.clone(),
            self.options.metadata_endpoint.clone(),
        )))
    }
}

#[async_trait]
impl TokenProvider for ApplicationDefault {
    async fn access_token(&self) -> AuthResult<String> {
        let provider = self.resolve()?;
        debug!(kind = provider.kind(), "resolved credential source");
        match provider.access_token().await {
            Err(AuthError::Metadata(detail)) => Err(AuthError::NotFound(format!(
                "{detail}. Run 'gcloud auth application-default login' or set {CREDENTIALS_ENV}"
            ))),
            other => other,
        }
    }

    fn kind(&self) -> &'static str {
        "application_default"
    }
}
