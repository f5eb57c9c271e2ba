//! Agentspace Registry Library
//!
//! Manages ADK agents registered in Google Agentspace apps: a typed client
//! for the Discovery Engine agents API with read-modify-write updates, the
//! app and reasoning-engine catalogs, and the HTTP API and dashboard that
//! expose them.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod gcp;
pub mod registry;
