//! Bearer token providers.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{AuthError, AuthResult};

/// OAuth scope requested for every token.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default OAuth token endpoint for user and service account credentials.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of bearer tokens for Google APIs.
///
/// Tokens are fetched on every call; callers never hold on to one across
/// operations.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a fresh access token.
    async fn access_token(&self) -> AuthResult<String>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

/// Token response shared by the OAuth endpoint and the metadata server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    expires_in: Option<i64>,
}

/// OAuth error body (`{"error": "...", "error_description": "..."}`).
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// A token supplied up front (config or `GOOGLE_OAUTH_ACCESS_TOKEN`).
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> AuthResult<String> {
        Ok(self.token.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

/// Tokens for the default service account of the VM or Cloud Run instance.
#[derive(Debug, Clone)]
pub struct MetadataServer {
    client: Client,
    endpoint: String,
}

impl MetadataServer {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.endpoint
        )
    }
}

#[async_trait]
impl TokenProvider for MetadataServer {
    async fn access_token(&self) -> AuthResult<String> {
        let url = self.token_url();
        debug!(url = %url, "requesting token from metadata server");
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| AuthError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Metadata(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Metadata(format!("unreadable token response: {e}")))?;
        Ok(token.access_token)
    }

    fn kind(&self) -> &'static str {
        "metadata"
    }
}

/// Contents of an `authorized_user` credentials file (gcloud ADC login).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUserKey {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Exchanges a refresh token for an access token.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    client: Client,
    key: AuthorizedUserKey,
}

impl AuthorizedUser {
    pub fn new(client: Client, key: AuthorizedUserKey) -> Self {
        Self { client, key }
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUser {
    async fn access_token(&self) -> AuthResult<String> {
        let token_uri = self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.key.client_id.as_str()),
            ("client_secret", self.key.client_secret.as_str()),
            ("refresh_token", self.key.refresh_token.as_str()),
        ];
        exchange(&self.client, token_uri, &form).await
    }

    fn kind(&self) -> &'static str {
        "authorized_user"
    }
}

/// Contents of a `service_account` key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs a JWT assertion with the service account key and trades it for a token.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    client: Client,
    key: ServiceAccountKey,
}

impl ServiceAccount {
    pub fn new(client: Client, key: ServiceAccountKey) -> Self {
        Self { client, key }
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    fn assertion(&self, now: i64) -> AuthResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: self.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        jsonwebtoken::encode(&header, &claims, &key).map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccount {
    async fn access_token(&self) -> AuthResult<String> {
        let assertion = self.assertion(chrono::Utc::now().timestamp())?;
        let form = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];
        exchange(&self.client, self.token_uri(), &form).await
    }

    fn kind(&self) -> &'static str {
        "service_account"
    }
}

/// POST a form to an OAuth token endpoint and pull out the access token.
async fn exchange(client: &Client, token_uri: &str, form: &[(&str, &str)]) -> AuthResult<String> {
    debug!(token_uri, "exchanging credentials for access token");
    let response = client
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let detail = match response.json::<TokenErrorResponse>().await {
            Ok(body) => match body.error_description {
                Some(desc) => format!("{}: {}", body.error, desc),
                None => body.error,
            },
            Err(_) => String::new(),
        };
        return Err(AuthError::TokenEndpoint(format!("{status} {detail}").trim().to_string()));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::TokenEndpoint(format!("unreadable token response: {e}")))?;
    Ok(token.access_token)
}
