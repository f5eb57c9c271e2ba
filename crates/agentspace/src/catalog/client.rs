//! Listing of Agentspace apps (Discovery Engine engines) and Vertex AI
//! reasoning engines.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthError, TokenProvider};

use super::error::{CatalogError, CatalogResult};

const DISCOVERY_API_VERSION: &str = "v1";
const AIPLATFORM_API_VERSION: &str = "v1beta1";

/// An Agentspace app as shown on the dashboard and `/api/as-agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub solution_type: String,
    /// Set by the HTTP layer so the console can address the app.
    #[serde(
        rename = "project_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
}

impl EngineSummary {
    /// Short engine id (last path segment).
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// A deployed reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningEngineSummary {
    /// Short id.
    pub name: String,
    /// Full resource path.
    pub resource_name: String,
    pub display_name: String,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnginesPage {
    #[serde(default)]
    engines: Vec<EngineSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReasoningEngine {
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    create_time: Option<String>,
    #[serde(default)]
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReasoningEnginesPage {
    #[serde(default)]
    reasoning_engines: Vec<RawReasoningEngine>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl From<RawReasoningEngine> for ReasoningEngineSummary {
    fn from(raw: RawReasoningEngine) -> Self {
        Self {
            name: raw.name.rsplit('/').next().unwrap_or_default().to_string(),
            display_name: raw.display_name,
            create_time: format_timestamp(raw.create_time.as_deref()),
            update_time: format_timestamp(raw.update_time.as_deref()),
            resource_name: raw.name,
        }
    }
}

/// `2024-05-01T10:00:00.123Z` becomes `2024-05-01 10:00:00 UTC`; absent is `N/A`.
pub fn format_timestamp(value: Option<&str>) -> String {
    match value {
        None | Some("") => "N/A".to_string(),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| {
                t.with_timezone(&Utc)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            })
            .unwrap_or_else(|_| raw.to_string()),
    }
}

/// What a listing is about; picks the operator-facing wording.
#[derive(Debug, Clone, Copy)]
enum Listing<'a> {
    Engines { collection_id: &'a str },
    ReasoningEngines,
}

impl Listing<'_> {
    fn label(&self) -> &'static str {
        match self {
            Self::Engines { .. } => "Discovery Engines",
            Self::ReasoningEngines => "Reasoning Engines",
        }
    }

    fn status_error(&self, status: StatusCode, detail: &str) -> CatalogError {
        let label = self.label();
        match (status, self) {
            (StatusCode::UNAUTHORIZED, _) => CatalogError::Credentials(detail.to_string()),
            (StatusCode::FORBIDDEN, Self::Engines { .. }) => CatalogError::PermissionDenied(format!(
                "Permission denied listing {label}: {detail}. Ensure the user/service account has 'Discovery Engine Viewer' role or equivalent permissions."
            )),
            (StatusCode::FORBIDDEN, Self::ReasoningEngines) => CatalogError::PermissionDenied(format!(
                "Permission denied listing {label}: {detail}. Ensure the user/service account has 'Vertex AI User' role or equivalent permissions for 'aiplatform.reasoningEngines.list'."
            )),
            (StatusCode::NOT_FOUND, Self::Engines { collection_id }) => CatalogError::NotFound(format!(
                "Resource not found (e.g., project, location, or collection '{collection_id}'): {detail}"
            )),
            (StatusCode::NOT_FOUND, Self::ReasoningEngines) => CatalogError::NotFound(format!(
                "Resource not found for {label} (e.g., project or location, or API not enabled/available in region): {detail}"
            )),
            _ => CatalogError::Api(format!("API error listing {label}: {status} {detail}")),
        }
    }

    fn unexpected(&self, detail: impl std::fmt::Display) -> CatalogError {
        CatalogError::Unexpected(format!(
            "An unexpected error occurred while listing {}: {detail}",
            self.label()
        ))
    }
}

/// Client for the two read-only catalogs shown on the dashboard.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    discovery_endpoint: Option<String>,
    aiplatform_endpoint: Option<String>,
}

impl CatalogClient {
    pub fn new(client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            tokens,
            discovery_endpoint: None,
            aiplatform_endpoint: None,
        }
    }

    /// Use a fixed Discovery Engine endpoint instead of the per-location host.
    pub fn with_discovery_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.discovery_endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    /// Use a fixed Vertex AI endpoint instead of the per-location host.
    pub fn with_aiplatform_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.aiplatform_endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    fn discovery_base(&self, location_id: &str) -> String {
        if let Some(endpoint) = &self.discovery_endpoint {
            return endpoint.clone();
        }
        if location_id == "global" {
            "https://discoveryengine.googleapis.com".to_string()
        } else {
            format!("https://{location_id}-discoveryengine.googleapis.com")
        }
    }

    fn aiplatform_base(&self, location_id: &str) -> String {
        match &self.aiplatform_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{location_id}-aiplatform.googleapis.com"),
        }
    }

    /// Resolve `base` plus the API path, one percent-encoded segment per id.
    fn endpoint(base: &str, segments: &[&str]) -> CatalogResult<Url> {
        let invalid = || CatalogError::Unexpected(format!("Invalid endpoint: {base}"));
        let mut url = Url::parse(base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// List engines in a collection, following every page.
    pub async fn list_engines(
        &self,
        project_id: &str,
        location_id: &str,
        collection_id: &str,
    ) -> CatalogResult<Vec<EngineSummary>> {
        if project_id.is_empty() {
            return Err(CatalogError::Invalid(
                "Project ID is required to list Discovery Engines.".to_string(),
            ));
        }
        if collection_id.is_empty() {
            return Err(CatalogError::Invalid(
                "Collection ID is required to list Discovery Engines.".to_string(),
            ));
        }

        check_location(location_id)?;

        let url = Self::endpoint(
            &self.discovery_base(location_id),
            &[
                DISCOVERY_API_VERSION,
                "projects",
                project_id,
                "locations",
                location_id,
                "collections",
                collection_id,
                "engines",
            ],
        )?;
        let listing = Listing::Engines { collection_id };

        let mut engines = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page: EnginesPage = self
                .fetch_page(&url, project_id, page_token.as_deref(), listing)
                .await?;
            engines.extend(page.engines);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        debug!(count = engines.len(), project_id, "listed engines");
        Ok(engines)
    }

    /// List reasoning engines in a region, following every page.
    pub async fn list_reasoning_engines(
        &self,
        project_id: &str,
        location_id: &str,
    ) -> CatalogResult<Vec<ReasoningEngineSummary>> {
        if project_id.is_empty() {
            return Err(CatalogError::Invalid(
                "Project ID is required to list Reasoning Engines.".to_string(),
            ));
        }
        if location_id.is_empty() {
            return Err(CatalogError::Invalid(
                "Location ID is required to list Reasoning Engines (e.g., 'us-central1')."
                    .to_string(),
            ));
        }

        check_location(location_id)?;

        let url = Self::endpoint(
            &self.aiplatform_base(location_id),
            &[
                AIPLATFORM_API_VERSION,
                "projects",
                project_id,
                "locations",
                location_id,
                "reasoningEngines",
            ],
        )?;
        let listing = Listing::ReasoningEngines;

        let mut engines = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page: ReasoningEnginesPage = self
                .fetch_page(&url, project_id, page_token.as_deref(), listing)
                .await?;
            engines.extend(page.reasoning_engines.into_iter().map(Into::into));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        debug!(count = engines.len(), project_id, location_id, "listed reasoning engines");
        Ok(engines)
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &Url,
        project_id: &str,
        page_token: Option<&str>,
        listing: Listing<'_>,
    ) -> CatalogResult<T> {
        let token = self.tokens.access_token().await.map_err(|e| match e {
            AuthError::NotFound(detail) => CatalogError::Credentials(detail),
            other => CatalogError::Credentials(other.to_string()),
        })?;

        let mut request = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header("X-Goog-User-Project", project_id);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request.send().await.map_err(|e| listing.unexpected(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(listing.status_error(status, body.trim()));
        }
        response.json().await.map_err(|e| listing.unexpected(e))
    }
}

/// Locations become part of a regional hostname.
fn check_location(location_id: &str) -> CatalogResult<()> {
    let valid = !location_id.is_empty()
        && location_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CatalogError::Invalid(format!(
            "Invalid location ID '{location_id}'."
        )))
    }
}
