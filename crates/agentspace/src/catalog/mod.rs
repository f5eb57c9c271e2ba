//! Read-only catalogs: Agentspace apps and deployed reasoning engines.

mod client;
mod error;

pub use client::{CatalogClient, EngineSummary, ReasoningEngineSummary, format_timestamp};
pub use error::{CatalogError, CatalogResult};
