//! HTTP API: agent registry routes, catalogs and the dashboard.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::HealthResponse;
pub use routes::create_router;
pub use state::{AppState, CatalogSettings};
