//! In-memory agent store for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{RegistryError, RegistryResult};
use super::store::AgentStore;
use super::types::{AgentKey, AgentPayload, AgentRecord, AppScope};

/// Agent store backed by a map of app scope to records in insertion order.
#[derive(Debug)]
pub struct MemoryAgentStore {
    apps: RwLock<HashMap<AppScope, Vec<AgentRecord>>>,
    next_id: AtomicU64,
    requests: AtomicUsize,
}

impl Default for MemoryAgentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            requests: AtomicUsize::new(0),
        }
    }

    /// Insert a record as-is. Used to seed fixtures.
    pub async fn insert(&self, scope: &AppScope, record: AgentRecord) {
        self.apps
            .write()
            .await
            .entry(scope.clone())
            .or_default()
            .push(record);
    }

    /// Number of store calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn not_found(key: &AgentKey) -> RegistryError {
        RegistryError::request(
            format!("404 Not Found NOT_FOUND: Agent {} not found", key.agent_path()),
            Some(404),
        )
    }
}

#[async_trait]
impl AgentStore for MemoryAgentStore {
    async fn list(&self, scope: &AppScope, _token: &str) -> RegistryResult<Vec<AgentRecord>> {
        self.count();
        Ok(self
            .apps
            .read()
            .await
            .get(scope)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, key: &AgentKey, _token: &str) -> RegistryResult<AgentRecord> {
        self.count();
        let apps = self.apps.read().await;
        apps.get(&key.scope())
            .and_then(|records| records.iter().find(|r| r.id() == key.agent_id))
            .cloned()
            .ok_or_else(|| Self::not_found(key))
    }

    async fn create(
        &self,
        scope: &AppScope,
        _token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord> {
        self.count();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = AgentRecord {
            name: format!("{}/{id}", scope.agents_path()),
            display_name: payload.display_name.clone(),
            description: payload.description.clone(),
            adk_agent_definition: Some(payload.adk_agent_definition.clone()),
            icon: payload.icon.clone(),
            extra: Default::default(),
        };
        self.apps
            .write()
            .await
            .entry(scope.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn patch(
        &self,
        key: &AgentKey,
        _token: &str,
        payload: &AgentPayload,
    ) -> RegistryResult<AgentRecord> {
        self.count();
        let mut apps = self.apps.write().await;
        let record = apps
            .get_mut(&key.scope())
            .and_then(|records| records.iter_mut().find(|r| r.id() == key.agent_id))
            .ok_or_else(|| Self::not_found(key))?;

        record.display_name = payload.display_name.clone();
        record.description = payload.description.clone();
        record.adk_agent_definition = Some(payload.adk_agent_definition.clone());
        // Groups absent from the body are left alone.
        if let Some(icon) = &payload.icon {
            record.icon = Some(icon.clone());
        }
        Ok(record.clone())
    }

    async fn delete(&self, key: &AgentKey, _token: &str) -> RegistryResult<()> {
        self.count();
        let mut apps = self.apps.write().await;
        let records = apps
            .get_mut(&key.scope())
            .ok_or_else(|| Self::not_found(key))?;
        let before = records.len();
        records.retain(|r| r.id() != key.agent_id);
        if records.len() == before {
            return Err(Self::not_found(key));
        }
        Ok(())
    }
}
