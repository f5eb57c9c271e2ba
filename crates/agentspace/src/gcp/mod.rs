//! Google Cloud environment helpers.

pub mod metadata;

pub use metadata::{PROJECT_ENV, ProjectError, ProjectResolver};
