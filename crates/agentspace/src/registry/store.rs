//! Remote agent store: the Discovery Engine agents API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{RegistryError, RegistryResult};
use super::types::{AgentKey, AgentPayload, AgentRecord, AppScope, ListAgentsResponse};

/// Default Discovery Engine endpoint.
pub const DEFAULT_DISCOVERY_ENDPOINT: &str = "https://discoveryengine.googleapis.com";

/// API version the agents resource is served under.
pub const AGENTS_API_VERSION: &str = "v1alpha";

/// Raw calls against an agent-record store.
///
/// Implementations do no validation and no retries; they map one call to one
/// remote request.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn list(&self, scope: &AppScope, token: &str) -> RegistryResult<Vec<AgentRecord>>;

    async fn get(&self, key: &AgentKey, token: &str) -> RegistryResult<AgentRecord>;

    async fn create(
        &self,
        scope: &AppScope,
        token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord>;

    async fn patch(
        &self,
        key: &AgentKey,
        token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord>;

    async fn delete(&self, key: &AgentKey, token: &str) -> RegistryResult<()>;
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// HTTP client for the agents API.
#[derive(Debug, Clone)]
pub struct HttpAgentStore {
    /// HTTP client.
    client: Client,
    /// Base URL (e.g., "https://discoveryengine.googleapis.com").
    base_url: String,
}

impl HttpAgentStore {
    /// Create a store. `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to create HTTP client");
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL with each segment percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> RegistryResult<Url> {
        let invalid =
            || RegistryError::request(format!("Invalid endpoint: {}", self.base_url), None);
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(AGENTS_API_VERSION)
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        token: &str,
        project_id: &str,
    ) -> reqwest::RequestBuilder {
        debug!(%method, %url, "agent store request");
        self.client
            .request(method, url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .header("X-Goog-User-Project", project_id)
    }

    /// Handle response and parse JSON or error.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> RegistryResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn check_status(response: Response) -> RegistryResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<GoogleErrorResponse>(&body) {
            Ok(envelope) if !envelope.error.message.is_empty() => {
                if envelope.error.status.is_empty() {
                    envelope.error.message
                } else {
                    format!("{}: {}", envelope.error.status, envelope.error.message)
                }
            }
            _ => body.trim().to_string(),
        };

        let message = if detail.is_empty() {
            status.to_string()
        } else {
            format!("{status} {detail}")
        };
        Err(RegistryError::request(message, Some(status.as_u16())))
    }
}

#[async_trait]
impl AgentStore for HttpAgentStore {
    async fn list(&self, scope: &AppScope, token: &str) -> RegistryResult<Vec<AgentRecord>> {
        let url = self.url(&scope.agents_segments())?;
        let response = self
            .request(reqwest::Method::GET, url, token, &scope.project_id)
            .send()
            .await?;
        let body: ListAgentsResponse = Self::handle_response(response).await?;
        Ok(body.agents)
    }

    async fn get(&self, key: &AgentKey, token: &str) -> RegistryResult<AgentRecord> {
        let url = self.url(&key.agent_segments())?;
        let response = self
            .request(reqwest::Method::GET, url, token, &key.project_id)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn create(
        &self,
        scope: &AppScope,
        token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord> {
        let url = self.url(&scope.agents_segments())?;
        let response = self
            .request(reqwest::Method::POST, url, token, &scope.project_id)
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn patch(
        &self,
        key: &AgentKey,
        token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord> {
        let url = self.url(&key.agent_segments())?;
        let response = self
            .request(reqwest::Method::PATCH, url, token, &key.project_id)
            .json(payload)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete(&self, key: &AgentKey, token: &str) -> RegistryResult<()> {
        let url = self.url(&key.agent_segments())?;
        let response = self
            .request(reqwest::Method::DELETE, url, token, &key.project_id)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
