//! API integration tests over the in-memory agent store.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};

mod common;
use common::{send, test_app};

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::DELETE)
        .body(Body::empty())
        .unwrap()
}

fn create_body() -> Value {
    json!({
        "project_id": "p1",
        "app_id": "a1",
        "display_name": "Bot",
        "description": "d",
        "tool_description": "t",
        "adk_deployment_id": "dep1"
    })
}

fn agent_id(record: &Value) -> String {
    record["name"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app();
    let (status, json) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_create_update_delete_get_scenario() {
    let (app, _) = test_app();

    let (status, created) = send(
        app.clone(),
        with_json(Method::POST, "/api/as-agents/add-agent", create_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status_code"], 200);
    let record = &created["data"];
    assert_eq!(
        record["adkAgentDefinition"]["provisionedReasoningEngine"]["reasoningEngine"],
        "projects/p1/locations/global/reasoningEngines/dep1"
    );
    let id = agent_id(record);
    assert!(!id.is_empty());

    let (status, updated) = send(
        app.clone(),
        with_json(
            Method::PUT,
            "/api/as-agents/update-agent",
            json!({"project_id": "p1", "app_id": "a1", "agent_id": id, "description": "d2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = &updated["updated_agent"];
    assert_eq!(updated["description"], "d2");
    assert_eq!(updated["displayName"], "Bot");
    assert_eq!(
        updated["adkAgentDefinition"]["toolSettings"]["toolDescription"],
        "t"
    );

    let (status, deleted) = send(
        app.clone(),
        delete(&format!(
            "/api/as-agents/delete-agent?project_id=p1&app_id=a1&agent_id={id}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["status_code"], 200);
    assert!(deleted["message"].as_str().unwrap().contains(&id));

    let (status, error) = send(
        app,
        get(&format!(
            "/api/as-agents/get-agent?project_id=p1&app_id=a1&agent_id={id}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
    assert_eq!(error["status_code"], 404);
    assert!(error["error"].as_str().unwrap().contains("Request failed"));
}

#[tokio::test]
async fn test_create_lists_every_missing_field() {
    let (app, store) = test_app();
    let (status, error) = send(
        app,
        with_json(
            Method::POST,
            "/api/as-agents/add-agent",
            json!({"project_id": "p1", "app_id": "a1", "description": "d"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .contains("Missing required parameters: display_name, tool_description, adk_deployment_id")
    );
    assert_eq!(store.request_count(), 0);
}

#[tokio::test]
async fn test_create_with_auth_and_icon() {
    let (app, _) = test_app();
    let mut body = create_body();
    body["auth_id"] = json!("oauth-1");
    body["icon_uri"] = json!("https://example.com/bot.png");
    let (status, created) = send(
        app,
        with_json(Method::POST, "/api/as-agents/add-agent", body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        created["data"]["adkAgentDefinition"]["authorizations"],
        json!(["projects/p1/locations/global/authorizations/oauth-1"])
    );
    assert_eq!(created["data"]["icon"]["uri"], "https://example.com/bot.png");
}

#[tokio::test]
async fn test_malformed_body_gets_error_envelope() {
    let (app, store) = test_app();
    let request = Request::builder()
        .uri("/api/as-agents/add-agent")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"project_id\": "))
        .unwrap();
    let (status, error) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");
    assert_eq!(error["status_code"], 400);
    assert!(error["error"].is_string());
    assert_eq!(store.request_count(), 0);
}

#[tokio::test]
async fn test_missing_content_type_gets_error_envelope() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/api/as-agents/update-agent")
        .method(Method::PUT)
        .body(Body::from(r#"{"project_id": "p1"}"#))
        .unwrap();
    let (status, error) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");
    assert!(error["error"].as_str().unwrap().contains("Content-Type"));
}

#[tokio::test]
async fn test_null_required_field_is_reported_missing() {
    let (app, _) = test_app();
    let mut body = create_body();
    body["display_name"] = Value::Null;
    let (status, error) = send(
        app,
        with_json(Method::POST, "/api/as-agents/add-agent", body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .contains("Missing required parameters: display_name")
    );
}

#[tokio::test]
async fn test_list_agents_requires_scope() {
    let (app, store) = test_app();
    let (status, error) = send(app, get("/api/as-agents/list-agents?project_id=p1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");
    assert!(error["error"].as_str().unwrap().contains("app_id"));
    assert_eq!(store.request_count(), 0);
}

#[tokio::test]
async fn test_list_agents_empty_app() {
    let (app, _) = test_app();
    let (status, body) = send(app, get("/api/as-agents/list-agents?project_id=p1&app_id=a1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"agents": []}));
}

#[tokio::test]
async fn test_update_via_patch_replaces_authorizations() {
    let (app, _) = test_app();
    let mut body = create_body();
    body["auth_id"] = json!("old");
    let (_, created) = send(
        app.clone(),
        with_json(Method::POST, "/api/as-agents/add-agent", body),
    )
    .await;
    let id = agent_id(&created["data"]);

    let (status, updated) = send(
        app,
        with_json(
            Method::PATCH,
            "/api/as-agents/update-agent",
            json!({
                "project_id": "p1",
                "app_id": "a1",
                "agent_id": id,
                "auth_id": "projects/p1/locations/global/authorizations/new"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        updated["updated_agent"]["adkAgentDefinition"]["authorizations"],
        json!(["projects/p1/locations/global/authorizations/new"])
    );
    assert_eq!(updated["updated_agent"]["description"], "d");
}

#[tokio::test]
async fn test_update_missing_agent_reports_dependent_failure() {
    let (app, store) = test_app();
    let (status, error) = send(
        app,
        with_json(
            Method::PUT,
            "/api/as-agents/update-agent",
            json!({"project_id": "p1", "app_id": "a1", "agent_id": "404", "description": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .contains("Could not retrieve agent details")
    );
    assert_eq!(store.request_count(), 1);
}

#[tokio::test]
async fn test_delete_requires_full_key() {
    let (app, store) = test_app();
    let (status, error) = send(app, delete("/api/as-agents/delete-agent?project_id=p1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .contains("app_id, agent_id")
    );
    assert_eq!(store.request_count(), 0);
}

#[tokio::test]
async fn test_get_agent_by_name() {
    let (app, _) = test_app();
    for name in ["Alpha", "Beta"] {
        let mut body = create_body();
        body["display_name"] = json!(name);
        let (status, _) = send(
            app.clone(),
            with_json(Method::POST, "/api/as-agents/add-agent", body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, found) = send(
        app.clone(),
        get("/api/as-agents/get-agent-by-name?project_id=p1&app_id=a1&display_name=Beta"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["agent"]["displayName"], "Beta");

    let (status, missing) = send(
        app,
        get("/api/as-agents/get-agent-by-name?project_id=p1&app_id=a1&display_name=Gamma"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        missing,
        json!({"message": "Agent with display name 'Gamma' not found."})
    );
}

#[tokio::test]
async fn test_reasoning_engines_requires_project() {
    let (app, _) = test_app();
    let (status, error) = send(app, get("/api/as-agents/list-reasoning-engines")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("project_id"));
}

#[tokio::test]
async fn test_apps_listing_failure_is_gateway_error() {
    let (app, _) = test_app();
    let (status, error) = send(app, get("/api/as-agents")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .contains("listing Discovery Engines")
    );
}

#[tokio::test]
async fn test_dashboard_renders_errors_inline() {
    let (app, _) = test_app();
    let response = tower::ServiceExt::oneshot(app, get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("<code>p1</code>"));
    assert!(html.contains("class=\"error\""));
}

#[tokio::test]
async fn test_console_page() {
    let (app, _) = test_app();
    let response = tower::ServiceExt::oneshot(app, get("/test-as")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
}
