//! Agent registry data model.
//!
//! Records use the Discovery Engine JSON layout (camelCase). Fields the
//! store returns that are not modelled here ride along in `extra` so a
//! record re-serializes to what the store sent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Location every agent and reference lives under.
pub const GLOBAL_LOCATION: &str = "global";

/// Collection holding Agentspace engines.
pub const DEFAULT_COLLECTION: &str = "default_collection";

/// Assistant agents are namespaced under.
pub const DEFAULT_ASSISTANT: &str = "default_assistant";

/// An Agentspace app (engine) within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppScope {
    pub project_id: String,
    pub app_id: String,
}

impl AppScope {
    pub fn new(project_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            app_id: app_id.into(),
        }
    }

    /// Path segments of the agents collection. Each id is one segment.
    pub fn agents_segments(&self) -> Vec<&str> {
        collection_segments(&self.project_id, &self.app_id)
    }

    /// Resource path of the agents collection, relative to the API version.
    pub fn agents_path(&self) -> String {
        format!(
            "projects/{}/locations/{GLOBAL_LOCATION}/collections/{DEFAULT_COLLECTION}/engines/{}/assistants/{DEFAULT_ASSISTANT}/agents",
            self.project_id, self.app_id
        )
    }

    pub fn agent(&self, agent_id: impl Into<String>) -> AgentKey {
        AgentKey {
            project_id: self.project_id.clone(),
            app_id: self.app_id.clone(),
            agent_id: agent_id.into(),
        }
    }
}

/// A single agent within an app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey {
    pub project_id: String,
    pub app_id: String,
    pub agent_id: String,
}

impl AgentKey {
    pub fn new(
        project_id: impl Into<String>,
        app_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            app_id: app_id.into(),
            agent_id: agent_id.into(),
        }
    }

    pub fn scope(&self) -> AppScope {
        AppScope::new(self.project_id.clone(), self.app_id.clone())
    }

    pub fn agent_segments(&self) -> Vec<&str> {
        let mut segments = collection_segments(&self.project_id, &self.app_id);
        segments.push(&self.agent_id);
        segments
    }

    pub fn agent_path(&self) -> String {
        format!("{}/{}", self.scope().agents_path(), self.agent_id)
    }
}

fn collection_segments<'a>(project_id: &'a str, app_id: &'a str) -> Vec<&'a str> {
    vec![
        "projects",
        project_id,
        "locations",
        GLOBAL_LOCATION,
        "collections",
        DEFAULT_COLLECTION,
        "engines",
        app_id,
        "assistants",
        DEFAULT_ASSISTANT,
        "agents",
    ]
}

/// Canonical reasoning engine reference built on create.
pub fn reasoning_engine_ref(project_id: &str, deployment_id: &str) -> String {
    format!("projects/{project_id}/locations/{GLOBAL_LOCATION}/reasoningEngines/{deployment_id}")
}

/// Canonical authorization reference built on create.
pub fn authorization_ref(project_id: &str, auth_id: &str) -> String {
    format!("projects/{project_id}/locations/{GLOBAL_LOCATION}/authorizations/{auth_id}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    #[serde(default)]
    pub tool_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedReasoningEngine {
    #[serde(default)]
    pub reasoning_engine: String,
}

/// The ADK definition group of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdkAgentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_settings: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_reasoning_engine: Option<ProvisionedReasoningEngine>,
    #[serde(default)]
    pub authorizations: Vec<String>,
}

impl AdkAgentDefinition {
    pub fn tool_description(&self) -> Option<&str> {
        self.tool_settings
            .as_ref()
            .map(|t| t.tool_description.as_str())
    }

    pub fn reasoning_engine(&self) -> Option<&str> {
        self.provisioned_reasoning_engine
            .as_ref()
            .map(|p| p.reasoning_engine.as_str())
    }
}

/// Icon group. Kept whole when an update leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Icon {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            extra: Map::new(),
        }
    }
}

/// An agent as stored by the remote registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Full resource name; the last segment is the agent id.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adk_agent_definition: Option<AdkAgentDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentRecord {
    /// Server-assigned id.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn tool_description(&self) -> Option<&str> {
        self.adk_agent_definition
            .as_ref()
            .and_then(|d| d.tool_description())
    }

    pub fn reasoning_engine(&self) -> Option<&str> {
        self.adk_agent_definition
            .as_ref()
            .and_then(|d| d.reasoning_engine())
    }

    pub fn authorizations(&self) -> &[String] {
        self.adk_agent_definition
            .as_ref()
            .map(|d| d.authorizations.as_slice())
            .unwrap_or_default()
    }
}

/// Body of a create or patch call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    pub display_name: String,
    pub description: String,
    pub adk_agent_definition: AdkAgentDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

/// List response. A missing `agents` key means no agents.
#[derive(Debug, Default, Deserialize)]
pub struct ListAgentsResponse {
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
}

/// Create request as accepted on the REST surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAgent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub app_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool_description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub adk_deployment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
}

/// Update request. Every content field is optional; empty counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub app_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adk_deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
}

impl UpdateAgent {
    pub fn key(&self) -> AgentKey {
        AgentKey::new(&self.project_id, &self.app_id, &self.agent_id)
    }
}

/// JSON `null` reads as an empty string, which validation reports as missing.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of a lookup by display name.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentLookup {
    Found(AgentRecord),
    /// The list was read and nothing matched.
    NotFound { display_name: String },
}

impl AgentLookup {
    pub fn not_found_message(display_name: &str) -> String {
        format!("Agent with display name '{display_name}' not found.")
    }

    pub fn found(&self) -> Option<&AgentRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound { .. } => None,
        }
    }
}

/// Acknowledgement of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteConfirmation {
    pub agent_id: String,
    pub message: String,
}

impl DeleteConfirmation {
    pub fn new(agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        let message = format!("Agent {agent_id} deleted successfully.");
        Self { agent_id, message }
    }
}

/// Returns the value when it is present and non-empty.
pub(crate) fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
