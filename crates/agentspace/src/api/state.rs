//! Application state shared across handlers.

use crate::catalog::CatalogClient;
use crate::gcp::ProjectResolver;
use crate::registry::{DEFAULT_COLLECTION, GLOBAL_LOCATION};
use crate::registry::AgentRegistry;

/// Where the dashboard and app listing look for engines.
#[derive(Clone, Debug)]
pub struct CatalogSettings {
    /// Discovery Engine location (`global`, `us`, `eu`).
    pub discovery_engine_location: String,
    /// Discovery Engine collection id.
    pub discovery_engine_collection: String,
    /// Default Vertex AI region for reasoning engines.
    pub reasoning_engine_location: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            discovery_engine_location: GLOBAL_LOCATION.to_string(),
            discovery_engine_collection: DEFAULT_COLLECTION.to_string(),
            reasoning_engine_location: "us-central1".to_string(),
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: AgentRegistry,
    pub catalog: CatalogClient,
    pub projects: ProjectResolver,
    pub settings: CatalogSettings,
}

impl AppState {
    pub fn new(
        registry: AgentRegistry,
        catalog: CatalogClient,
        projects: ProjectResolver,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            registry,
            catalog,
            projects,
            settings,
        }
    }
}
