//! API route definitions.

use axum::http::{Method, header};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let agent_routes = Router::new()
        .route("/list-agents", get(handlers::list_agents))
        .route("/add-agent", post(handlers::add_agent))
        .route("/get-agent", get(handlers::get_agent))
        .route(
            "/update-agent",
            put(handlers::update_agent).patch(handlers::update_agent),
        )
        .route("/delete-agent", delete(handlers::delete_agent))
        .route("/get-agent-by-name", get(handlers::get_agent_by_name))
        .route(
            "/list-reasoning-engines",
            get(handlers::list_reasoning_engines),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .route("/test-as", get(handlers::test_console))
        .route("/api/as-agents", get(handlers::list_apps))
        .nest("/api/as-agents", agent_routes)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}

/// The console may be served from another origin during development.
fn build_cors_layer() -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers(headers)
}
