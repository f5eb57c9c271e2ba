//! Payload construction for create and the read-modify-write update.
//!
//! The store patches whole field groups, so an update must send the complete
//! desired state of every group it touches. `merge_update` rebuilds that state
//! from the current record and the caller's non-empty fields.

use super::error::{RegistryError, RegistryResult};
use super::types::{
    AdkAgentDefinition, AgentPayload, AgentRecord, CreateAgent, Icon, ProvisionedReasoningEngine,
    ToolSettings, UpdateAgent, authorization_ref, provided, reasoning_engine_ref,
};

/// Fail with every named field whose value is empty.
pub fn check_required(fields: &[(&'static str, &str)]) -> RegistryResult<()> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::MissingParameter(missing))
    }
}

/// Validate a create request.
pub fn validate_create(request: &CreateAgent) -> RegistryResult<()> {
    check_required(&[
        ("project_id", request.project_id.as_str()),
        ("app_id", request.app_id.as_str()),
        ("display_name", request.display_name.as_str()),
        ("description", request.description.as_str()),
        ("tool_description", request.tool_description.as_str()),
        ("adk_deployment_id", request.adk_deployment_id.as_str()),
    ])
}

/// Body for a create call. Composes the canonical engine and authorization paths.
pub fn create_payload(request: &CreateAgent) -> AgentPayload {
    let authorizations = match provided(&request.auth_id) {
        Some(auth_id) => vec![authorization_ref(&request.project_id, auth_id)],
        None => Vec::new(),
    };

    AgentPayload {
        display_name: request.display_name.clone(),
        description: request.description.clone(),
        adk_agent_definition: AdkAgentDefinition {
            tool_settings: Some(ToolSettings {
                tool_description: request.tool_description.clone(),
            }),
            provisioned_reasoning_engine: Some(ProvisionedReasoningEngine {
                reasoning_engine: reasoning_engine_ref(
                    &request.project_id,
                    &request.adk_deployment_id,
                ),
            }),
            authorizations,
        },
        icon: provided(&request.icon_uri).map(Icon::from_uri),
    }
}

/// Merge an update request over the current record.
///
/// `adk_deployment_id` and `auth_id` are written verbatim; unlike create they
/// are not expanded into resource paths.
pub fn merge_update(current: &AgentRecord, update: &UpdateAgent) -> AgentPayload {
    let current_adk = current.adk_agent_definition.as_ref();

    let display_name = pick(&update.display_name, Some(current.display_name.as_str()));
    let description = pick(&update.description, Some(current.description.as_str()));
    let tool_description = pick(&update.tool_description, current.tool_description());
    let reasoning_engine = pick(&update.adk_deployment_id, current.reasoning_engine());

    let authorizations = match provided(&update.auth_id) {
        Some(auth_id) => vec![auth_id.to_string()],
        None => current_adk
            .map(|adk| adk.authorizations.clone())
            .unwrap_or_default(),
    };

    let icon = match provided(&update.icon_uri) {
        Some(uri) => Some(Icon::from_uri(uri)),
        None => current.icon.clone(),
    };

    AgentPayload {
        display_name,
        description,
        adk_agent_definition: AdkAgentDefinition {
            tool_settings: Some(ToolSettings { tool_description }),
            provisioned_reasoning_engine: Some(ProvisionedReasoningEngine { reasoning_engine }),
            authorizations,
        },
        icon,
    }
}

fn pick(requested: &Option<String>, current: Option<&str>) -> String {
    provided(requested)
        .or(current)
        .unwrap_or_default()
        .to_string()
}
