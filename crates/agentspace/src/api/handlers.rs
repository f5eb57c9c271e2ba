//! API request handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    response::Html,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::{EngineSummary, ReasoningEngineSummary};
use crate::dashboard::{self, DashboardView};
use crate::registry::{
    AgentKey, AgentLookup, AgentRecord, AppScope, CreateAgent, UpdateAgent, check_required,
};

use super::error::ApiResult;
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Query addressing an app.
#[derive(Debug, Default, Deserialize)]
pub struct AppQuery {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub app_id: String,
}

/// Query addressing one agent.
#[derive(Debug, Default, Deserialize)]
pub struct AgentQuery {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub agent_id: String,
}

impl AgentQuery {
    fn key(&self) -> AgentKey {
        AgentKey::new(&self.project_id, &self.app_id, &self.agent_id)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentNameQuery {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasoningEngineQuery {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListAgentsResponse {
    pub agents: Vec<AgentRecord>,
}

#[derive(Debug, Serialize)]
pub struct CreatedAgentResponse {
    pub status_code: u16,
    pub data: AgentRecord,
}

#[derive(Debug, Serialize)]
pub struct AgentDetailsResponse {
    pub agent_details: AgentRecord,
}

#[derive(Debug, Serialize)]
pub struct UpdatedAgentResponse {
    pub status_code: u16,
    pub updated_agent: AgentRecord,
}

#[derive(Debug, Serialize)]
pub struct DeletedAgentResponse {
    pub status_code: u16,
    pub message: String,
}

/// Body of a lookup by display name: the record, or a not-found message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AgentByNameResponse {
    Found { agent: AgentRecord },
    NotFound { message: String },
}

impl From<AgentLookup> for AgentByNameResponse {
    fn from(lookup: AgentLookup) -> Self {
        match lookup {
            AgentLookup::Found(agent) => Self::Found { agent },
            AgentLookup::NotFound { display_name } => Self::NotFound {
                message: AgentLookup::not_found_message(&display_name),
            },
        }
    }
}

/// List the Agentspace apps of the current project.
#[instrument(skip(state))]
pub async fn list_apps(State(state): State<AppState>) -> ApiResult<Json<Vec<EngineSummary>>> {
    let project_id = state.projects.project_id().await?;
    let mut engines = state
        .catalog
        .list_engines(
            &project_id,
            &state.settings.discovery_engine_location,
            &state.settings.discovery_engine_collection,
        )
        .await?;
    for engine in &mut engines {
        engine.project_id = Some(project_id.clone());
    }
    Ok(Json(engines))
}

#[instrument(skip(state))]
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<AppQuery>,
) -> ApiResult<Json<ListAgentsResponse>> {
    let scope = AppScope::new(query.project_id, query.app_id);
    let agents = state.registry.list(&scope).await?;
    Ok(Json(ListAgentsResponse { agents }))
}

#[instrument(skip(state, payload))]
pub async fn add_agent(
    State(state): State<AppState>,
    payload: Result<Json<CreateAgent>, JsonRejection>,
) -> ApiResult<Json<CreatedAgentResponse>> {
    let Json(request) = payload?;
    let data = state.registry.create(&request).await?;
    Ok(Json(CreatedAgentResponse {
        status_code: 200,
        data,
    }))
}

#[instrument(skip(state))]
pub async fn get_agent(
    State(state): State<AppState>,
    Query(query): Query<AgentQuery>,
) -> ApiResult<Json<AgentDetailsResponse>> {
    let agent_details = state.registry.get(&query.key()).await?;
    Ok(Json(AgentDetailsResponse { agent_details }))
}

#[instrument(skip(state, payload))]
pub async fn update_agent(
    State(state): State<AppState>,
    payload: Result<Json<UpdateAgent>, JsonRejection>,
) -> ApiResult<Json<UpdatedAgentResponse>> {
    let Json(request) = payload?;
    let updated_agent = state.registry.update(&request).await?;
    Ok(Json(UpdatedAgentResponse {
        status_code: 200,
        updated_agent,
    }))
}

#[instrument(skip(state))]
pub async fn delete_agent(
    State(state): State<AppState>,
    Query(query): Query<AgentQuery>,
) -> ApiResult<Json<DeletedAgentResponse>> {
    let confirmation = state.registry.delete(&query.key()).await?;
    Ok(Json(DeletedAgentResponse {
        status_code: 200,
        message: confirmation.message,
    }))
}

#[instrument(skip(state))]
pub async fn get_agent_by_name(
    State(state): State<AppState>,
    Query(query): Query<AgentNameQuery>,
) -> ApiResult<Json<AgentByNameResponse>> {
    let scope = AppScope::new(query.project_id, query.app_id);
    let lookup = state
        .registry
        .find_by_display_name(&scope, &query.display_name)
        .await?;
    Ok(Json(lookup.into()))
}

#[instrument(skip(state))]
pub async fn list_reasoning_engines(
    State(state): State<AppState>,
    Query(query): Query<ReasoningEngineQuery>,
) -> ApiResult<Json<Vec<ReasoningEngineSummary>>> {
    check_required(&[("project_id", query.project_id.as_str())])?;
    let location_id = query
        .location_id
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.settings.reasoning_engine_location.clone());
    let engines = state
        .catalog
        .list_reasoning_engines(&query.project_id, &location_id)
        .await?;
    Ok(Json(engines))
}

/// Dashboard: project, apps and reasoning engines, each with its own error.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let settings = &state.settings;
    let project = state.projects.project_id().await.map_err(|e| e.to_string());

    let (engines, reasoning_engines) = match &project {
        Ok(project_id) => {
            let (engines, reasoning_engines) = tokio::join!(
                state.catalog.list_engines(
                    project_id,
                    &settings.discovery_engine_location,
                    &settings.discovery_engine_collection,
                ),
                state
                    .catalog
                    .list_reasoning_engines(project_id, &settings.reasoning_engine_location),
            );
            (
                engines.map_err(|e| e.to_string()),
                reasoning_engines.map_err(|e| e.to_string()),
            )
        }
        Err(_) => {
            let skipped = "Project ID not available.".to_string();
            (Err(skipped.clone()), Err(skipped))
        }
    };

    Html(dashboard::render_index(&DashboardView {
        project,
        discovery_engine_location: settings.discovery_engine_location.clone(),
        discovery_engine_collection: settings.discovery_engine_collection.clone(),
        engines,
        reasoning_engine_location: settings.reasoning_engine_location.clone(),
        reasoning_engines,
    }))
}

/// Agent console.
pub async fn test_console() -> Html<String> {
    Html(dashboard::render_console())
}
