//! Agent registry client: typed operations over an [`AgentStore`].

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::auth::TokenProvider;

use super::error::{RegistryError, RegistryResult};
use super::merge::{check_required, create_payload, merge_update, validate_create};
use super::store::AgentStore;
use super::types::{
    AgentKey, AgentLookup, AgentRecord, AppScope, CreateAgent, DeleteConfirmation, UpdateAgent,
};

/// Stateless facade over the remote agent store.
///
/// Every operation fetches a fresh token and talks to the store directly.
/// `update` is a read followed by a write with nothing in between guarding
/// against a concurrent writer; the later write wins.
#[derive(Clone)]
pub struct AgentRegistry {
    store: Arc<dyn AgentStore>,
    tokens: Arc<dyn TokenProvider>,
}

impl AgentRegistry {
    pub fn new(store: Arc<dyn AgentStore>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { store, tokens }
    }

    async fn token(&self, operation: &str) -> RegistryResult<String> {
        self.tokens.access_token().await.map_err(|e| {
            error!("{operation}: authentication error: {e}");
            RegistryError::from(e)
        })
    }

    /// Create an agent in the app's default assistant.
    pub async fn create(&self, request: &CreateAgent) -> RegistryResult<AgentRecord> {
        validate_create(request)?;
        let token = self.token("Create Agent").await?;
        let scope = AppScope::new(&request.project_id, &request.app_id);
        let payload = create_payload(request);

        let record = self
            .store
            .create(&scope, &token, &payload)
            .await
            .inspect_err(|e| error!("Create Agent Error: {e}"))?;
        info!(
            project_id = %scope.project_id,
            app_id = %scope.app_id,
            agent_id = record.id(),
            "created agent"
        );
        Ok(record)
    }

    /// List every agent in an app.
    pub async fn list(&self, scope: &AppScope) -> RegistryResult<Vec<AgentRecord>> {
        check_required(&[
            ("project_id", scope.project_id.as_str()),
            ("app_id", scope.app_id.as_str()),
        ])?;
        let token = self.token("List Agents").await?;
        let agents = self
            .store
            .list(scope, &token)
            .await
            .inspect_err(|e| error!("List Agents Error: {e}"))?;
        debug!(count = agents.len(), app_id = %scope.app_id, "listed agents");
        Ok(agents)
    }

    /// Fetch one agent.
    pub async fn get(&self, key: &AgentKey) -> RegistryResult<AgentRecord> {
        check_key(key)?;
        let token = self.token("Get Agent").await?;
        self.store
            .get(key, &token)
            .await
            .inspect_err(|e| error!("Get Agent Error: {e}"))
    }

    /// Read-modify-write update. Omitted or empty fields keep their stored value.
    pub async fn update(&self, request: &UpdateAgent) -> RegistryResult<AgentRecord> {
        let key = request.key();
        check_key(&key)?;

        let current = self
            .get(&key)
            .await
            .map_err(|e| RegistryError::Dependent { source: Box::new(e) })?;
        let payload = merge_update(&current, request);

        let token = self.token("Update Agent").await?;
        let record = self
            .store
            .patch(&key, &token, &payload)
            .await
            .inspect_err(|e| error!("Update Agent Error: {e}"))?;
        info!(agent_id = %key.agent_id, "updated agent");
        Ok(record)
    }

    /// Delete an agent. Absence is not re-checked afterwards.
    pub async fn delete(&self, key: &AgentKey) -> RegistryResult<DeleteConfirmation> {
        check_key(key)?;
        let token = self.token("Delete Agent").await?;
        self.store
            .delete(key, &token)
            .await
            .inspect_err(|e| error!("Delete Agent Error: {e}"))?;
        info!(agent_id = %key.agent_id, "deleted agent");
        Ok(DeleteConfirmation::new(&key.agent_id))
    }

    /// First agent in list order whose display name matches exactly.
    pub async fn find_by_display_name(
        &self,
        scope: &AppScope,
        display_name: &str,
    ) -> RegistryResult<AgentLookup> {
        check_required(&[
            ("project_id", scope.project_id.as_str()),
            ("app_id", scope.app_id.as_str()),
            ("display_name", display_name),
        ])?;

        let agents = self.list(scope).await?;
        Ok(agents
            .into_iter()
            .find(|agent| agent.display_name == display_name)
            .map(AgentLookup::Found)
            .unwrap_or_else(|| AgentLookup::NotFound {
                display_name: display_name.to_string(),
            }))
    }
}

fn check_key(key: &AgentKey) -> RegistryResult<()> {
    check_required(&[
        ("project_id", key.project_id.as_str()),
        ("app_id", key.app_id.as_str()),
        ("agent_id", key.agent_id.as_str()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, AuthResult, StaticToken};
    use crate::registry::memory::MemoryAgentStore;
    use crate::registry::types::{
        AdkAgentDefinition, Icon, ProvisionedReasoningEngine, ToolSettings,
    };
    use async_trait::async_trait;

    struct NoCredentials;

    #[async_trait]
    impl TokenProvider for NoCredentials {
        async fn access_token(&self) -> AuthResult<String> {
            Err(AuthError::NotFound("nothing configured".to_string()))
        }

        fn kind(&self) -> &'static str {
            "none"
        }
    }

    fn registry() -> (AgentRegistry, Arc<MemoryAgentStore>) {
        let store = Arc::new(MemoryAgentStore::new());
        let registry = AgentRegistry::new(store.clone(), Arc::new(StaticToken::new("token")));
        (registry, store)
    }

    fn create_request() -> CreateAgent {
        CreateAgent {
            project_id: "p1".to_string(),
            app_id: "a1".to_string(),
            display_name: "Bot".to_string(),
            description: "d".to_string(),
            tool_description: "t".to_string(),
            adk_deployment_id: "dep1".to_string(),
            auth_id: None,
            icon_uri: None,
        }
    }

    fn record(scope: &AppScope, id: &str, display_name: &str) -> AgentRecord {
        AgentRecord {
            name: format!("{}/{id}", scope.agents_path()),
            display_name: display_name.to_string(),
            ..AgentRecord::default()
        }
    }

    #[tokio::test]
    async fn test_create_returns_assigned_id_and_reference() {
        let (registry, _) = registry();
        let created = registry.create(&create_request()).await.unwrap();
        assert!(!created.id().is_empty());
        assert_eq!(
            created.reasoning_engine(),
            Some("projects/p1/locations/global/reasoningEngines/dep1")
        );
    }

    #[tokio::test]
    async fn test_create_validation_runs_before_auth() {
        let store = Arc::new(MemoryAgentStore::new());
        let registry = AgentRegistry::new(store.clone(), Arc::new(NoCredentials));
        let mut request = create_request();
        request.display_name.clear();
        request.tool_description.clear();
        let err = registry.create(&request).await.unwrap_err();
        match err {
            RegistryError::MissingParameter(missing) => {
                assert_eq!(missing, vec!["display_name", "tool_description"])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_is_wrapped() {
        let registry = AgentRegistry::new(
            Arc::new(MemoryAgentStore::new()),
            Arc::new(NoCredentials),
        );
        let err = registry
            .list(&AppScope::new("p1", "a1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Auth(_)));
        assert!(err.to_string().starts_with("Authentication failed: "));
    }

    #[tokio::test]
    async fn test_update_preserves_and_overrides() {
        let (registry, store) = registry();
        let scope = AppScope::new("p1", "a1");
        let mut seeded = record(&scope, "7", "Bot");
        seeded.description = "d".to_string();
        seeded.adk_agent_definition = Some(AdkAgentDefinition {
            tool_settings: Some(ToolSettings {
                tool_description: "T1".to_string(),
            }),
            provisioned_reasoning_engine: Some(ProvisionedReasoningEngine {
                reasoning_engine: "ref".to_string(),
            }),
            authorizations: vec!["auth".to_string()],
        });
        seeded.icon = Some(Icon::from_uri("icon"));
        store.insert(&scope, seeded).await;

        let updated = registry
            .update(&UpdateAgent {
                project_id: "p1".to_string(),
                app_id: "a1".to_string(),
                agent_id: "7".to_string(),
                description: Some("d2".to_string()),
                ..UpdateAgent::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.description, "d2");
        assert_eq!(updated.display_name, "Bot");
        assert_eq!(updated.tool_description(), Some("T1"));
        assert_eq!(updated.reasoning_engine(), Some("ref"));
        assert_eq!(updated.authorizations(), ["auth".to_string()]);
        assert_eq!(updated.icon, Some(Icon::from_uri("icon")));
    }

    #[tokio::test]
    async fn test_update_of_missing_agent_never_writes() {
        let (registry, store) = registry();
        let err = registry
            .update(&UpdateAgent {
                project_id: "p1".to_string(),
                app_id: "a1".to_string(),
                agent_id: "missing".to_string(),
                description: Some("d2".to_string()),
                ..UpdateAgent::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Dependent { .. }));
        assert!(
            err.to_string()
                .starts_with("Could not retrieve agent details: ")
        );
        assert!(err.is_not_found());
        // Only the read reached the store.
        assert_eq!(store.request_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_full_key_before_any_call() {
        let (registry, store) = registry();
        let err = registry
            .delete(&AgentKey::new("p1", "", ""))
            .await
            .unwrap_err();
        match err {
            RegistryError::MissingParameter(missing) => {
                assert_eq!(missing, vec!["app_id", "agent_id"])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_confirmation_names_agent() {
        let (registry, store) = registry();
        let scope = AppScope::new("p1", "a1");
        store.insert(&scope, record(&scope, "55", "Bot")).await;
        let confirmation = registry.delete(&scope.agent("55")).await.unwrap();
        assert_eq!(confirmation.agent_id, "55");
        assert!(confirmation.message.contains("55"));
    }

    #[tokio::test]
    async fn test_find_by_display_name() {
        let (registry, store) = registry();
        let scope = AppScope::new("p1", "a1");
        store.insert(&scope, record(&scope, "1", "Alpha")).await;
        store.insert(&scope, record(&scope, "2", "Beta")).await;
        store.insert(&scope, record(&scope, "3", "Beta")).await;

        let found = registry.find_by_display_name(&scope, "Beta").await.unwrap();
        assert_eq!(found.found().map(|r| r.id()), Some("2"));

        let missing = registry
            .find_by_display_name(&scope, "Gamma")
            .await
            .unwrap();
        assert_eq!(
            missing,
            AgentLookup::NotFound {
                display_name: "Gamma".to_string()
            }
        );

        let case = registry.find_by_display_name(&scope, "beta").await.unwrap();
        assert!(case.found().is_none());
    }

    #[tokio::test]
    async fn test_list_empty_app() {
        let (registry, _) = registry();
        let agents = registry.list(&AppScope::new("p1", "a1")).await.unwrap();
        assert!(agents.is_empty());
    }
}
