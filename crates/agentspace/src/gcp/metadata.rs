//! Project id discovery.
//!
//! On Cloud Run and GCE the metadata server knows the project. Elsewhere the
//! configured project or `GOOGLE_CLOUD_PROJECT` is used.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::DEFAULT_METADATA_ENDPOINT;

pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(
        "Could not determine GCP project id: metadata server unavailable ({0}) and no project configured"
    )]
    Unresolved(String),
}

/// Resolves the project id, asking the metadata server first.
#[derive(Debug, Clone)]
pub struct ProjectResolver {
    client: Client,
    endpoint: String,
    configured: Option<String>,
}

impl ProjectResolver {
    pub fn new(client: Client, configured: Option<String>) -> Self {
        Self {
            client,
            endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            configured: configured.filter(|p| !p.is_empty()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn project_id(&self) -> Result<String, ProjectError> {
        match self.from_metadata().await {
            Ok(project) => {
                debug!(project_id = %project, "project id from metadata server");
                Ok(project)
            }
            Err(reason) => {
                if let Some(project) = self.fallback() {
                    debug!(project_id = %project, "project id from configuration");
                    return Ok(project);
                }
                warn!("Failed to determine project id: {reason}");
                Err(ProjectError::Unresolved(reason))
            }
        }
    }

    fn fallback(&self) -> Option<String> {
        self.configured.clone().or_else(|| {
            std::env::var(PROJECT_ENV)
                .ok()
                .filter(|p| !p.trim().is_empty())
        })
    }

    async fn from_metadata(&self) -> Result<String, String> {
        let url = format!("{}/computeMetadata/v1/project/project-id", self.endpoint);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("metadata server returned {status}"));
        }
        let project = response.text().await.map_err(|e| e.to_string())?;
        let project = project.trim();
        if project.is_empty() {
            return Err("metadata server returned an empty project id".to_string());
        }
        Ok(project.to_string())
    }
}
