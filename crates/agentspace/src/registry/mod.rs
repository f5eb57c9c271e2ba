//! Agent registry module.
//!
//! Typed create/list/get/update/delete/find operations over the Discovery
//! Engine agents API, including the read-modify-write merge used by update.

mod client;
mod error;
mod memory;
mod merge;
mod store;
mod types;

pub use client::AgentRegistry;
pub use error::{RegistryError, RegistryResult};
pub use memory::MemoryAgentStore;
pub use merge::{check_required, create_payload, merge_update, validate_create};
pub use store::{AGENTS_API_VERSION, AgentStore, DEFAULT_DISCOVERY_ENDPOINT, HttpAgentStore};
pub use types::*;
