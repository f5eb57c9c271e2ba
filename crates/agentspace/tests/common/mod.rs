//! Test utilities and common setup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agentspace::api::{self, AppState, CatalogSettings};
use agentspace::auth::StaticToken;
use agentspace::catalog::CatalogClient;
use agentspace::gcp::ProjectResolver;
use agentspace::registry::{AgentRegistry, MemoryAgentStore};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Nothing listens here; connections are refused immediately.
pub const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

pub const TEST_PROJECT: &str = "p1";

/// App whose agent listing answers 200 with a non-JSON body.
pub const GARBLED_APP: &str = "garbled";

/// Router over an in-memory agent store. Catalog calls go nowhere.
pub fn test_app() -> (Router, Arc<MemoryAgentStore>) {
    let store = Arc::new(MemoryAgentStore::new());
    let tokens = Arc::new(StaticToken::new("test-token"));
    let registry = AgentRegistry::new(store.clone(), tokens.clone());

    let client = reqwest::Client::new();
    let catalog = CatalogClient::new(client.clone(), tokens)
        .with_discovery_endpoint(DEAD_ENDPOINT)
        .with_aiplatform_endpoint(DEAD_ENDPOINT);
    let projects =
        ProjectResolver::new(client, Some(TEST_PROJECT.to_string())).with_endpoint(DEAD_ENDPOINT);

    let state = AppState::new(registry, catalog, projects, CatalogSettings::default());
    (api::create_router(state), store)
}

/// Router whose registry, catalogs and metadata lookups all hit `base_url`.
pub fn test_app_against(base_url: &str) -> Router {
    let client = reqwest::Client::new();
    let tokens = Arc::new(StaticToken::new("test-token"));
    let store = Arc::new(agentspace::registry::HttpAgentStore::with_client(
        client.clone(),
        base_url,
    ));
    let registry = AgentRegistry::new(store, tokens.clone());
    let catalog = CatalogClient::new(client.clone(), tokens)
        .with_discovery_endpoint(base_url)
        .with_aiplatform_endpoint(base_url);
    let projects = ProjectResolver::new(client, None).with_endpoint(base_url);
    let state = AppState::new(registry, catalog, projects, CatalogSettings::default());
    api::create_router(state)
}

/// Send a request and decode the JSON body (`Null` for non-JSON bodies).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Headers seen by the fake Google server on one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub user_project: Option<String>,
    pub content_type: Option<String>,
}

/// Shared state of the fake Google APIs.
#[derive(Default)]
pub struct FakeGoogle {
    pub agents: Mutex<HashMap<String, Vec<Value>>>,
    pub seen: Mutex<Vec<SeenRequest>>,
    next_id: Mutex<u64>,
}

impl FakeGoogle {
    fn record(&self, method: &str, path: String, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenRequest {
            method: method.to_string(),
            path,
            authorization: header("authorization"),
            user_project: header("x-goog-user-project"),
            content_type: header("content-type"),
        });
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Seed an agent record in an app.
    pub fn seed(&self, project: &str, app: &str, id: &str, record: Value) {
        let mut record = record;
        record["name"] = json!(format!("{}/{id}", agents_path(project, app)));
        self.agents
            .lock()
            .unwrap()
            .entry(app.to_string())
            .or_default()
            .push(record);
    }
}

pub fn agents_path(project: &str, app: &str) -> String {
    format!(
        "projects/{project}/locations/global/collections/default_collection/engines/{app}/assistants/default_assistant/agents"
    )
}

fn google_error(status: StatusCode, message: &str) -> Response {
    let code = status.as_u16();
    let status_name = match code {
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        _ => "INVALID_ARGUMENT",
    };
    (
        status,
        Json(json!({"error": {"code": code, "message": message, "status": status_name}})),
    )
        .into_response()
}

type Shared = State<Arc<FakeGoogle>>;

async fn list_agents(
    State(fake): Shared,
    Path((project, app)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    fake.record("GET", agents_path(&project, &app), &headers);
    if app == GARBLED_APP {
        return "<html>not json</html>".into_response();
    }
    let agents = fake.agents.lock().unwrap().get(&app).cloned();
    match agents {
        // Google omits the key when an app has no agents.
        None => Json(json!({})).into_response(),
        Some(agents) => Json(json!({ "agents": agents })).into_response(),
    }
}

async fn create_agent(
    State(fake): Shared,
    Path((project, app)): Path<(String, String)>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    fake.record("POST", agents_path(&project, &app), &headers);
    let id = {
        let mut next = fake.next_id.lock().unwrap();
        *next += 1;
        format!("{}", 1000 + *next)
    };
    body["name"] = json!(format!("{}/{id}", agents_path(&project, &app)));
    fake.agents
        .lock()
        .unwrap()
        .entry(app)
        .or_default()
        .push(body.clone());
    Json(body).into_response()
}

fn find_agent<'a>(agents: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    agents.iter_mut().find(|a| {
        a["name"]
            .as_str()
            .is_some_and(|n| n.rsplit('/').next() == Some(id))
    })
}

async fn get_agent(
    State(fake): Shared,
    Path((project, app, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    fake.record("GET", format!("{}/{id}", agents_path(&project, &app)), &headers);
    let mut apps = fake.agents.lock().unwrap();
    match apps.get_mut(&app).and_then(|a| find_agent(a, &id)) {
        Some(agent) => Json(agent.clone()).into_response(),
        None => google_error(StatusCode::NOT_FOUND, &format!("Agent {id} not found.")),
    }
}

async fn patch_agent(
    State(fake): Shared,
    Path((project, app, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("PATCH", format!("{}/{id}", agents_path(&project, &app)), &headers);
    let mut apps = fake.agents.lock().unwrap();
    match apps.get_mut(&app).and_then(|a| find_agent(a, &id)) {
        Some(agent) => {
            if let (Some(target), Some(fields)) = (agent.as_object_mut(), body.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            Json(agent.clone()).into_response()
        }
        None => google_error(StatusCode::NOT_FOUND, &format!("Agent {id} not found.")),
    }
}

async fn delete_agent(
    State(fake): Shared,
    Path((project, app, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    fake.record("DELETE", format!("{}/{id}", agents_path(&project, &app)), &headers);
    let mut apps = fake.agents.lock().unwrap();
    let Some(agents) = apps.get_mut(&app) else {
        return google_error(StatusCode::NOT_FOUND, &format!("Agent {id} not found."));
    };
    let before = agents.len();
    agents.retain(|a| a["name"].as_str().and_then(|n| n.rsplit('/').next()) != Some(id.as_str()));
    if agents.len() == before {
        return google_error(StatusCode::NOT_FOUND, &format!("Agent {id} not found."));
    }
    Json(json!({})).into_response()
}

/// Two pages of engines. Project `denied` gets a 403.
async fn list_engines(
    State(fake): Shared,
    Path((project, location, collection)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let path = format!("projects/{project}/locations/{location}/collections/{collection}/engines");
    fake.record("GET", path.clone(), &headers);
    if project == "denied" {
        return google_error(StatusCode::FORBIDDEN, "caller lacks discoveryengine.engines.list");
    }
    match query.get("pageToken").map(String::as_str) {
        None => Json(json!({
            "engines": [{
                "name": format!("{path}/support-app"),
                "displayName": "Support",
                "solutionType": "SOLUTION_TYPE_SEARCH"
            }],
            "nextPageToken": "page-2"
        }))
        .into_response(),
        Some("page-2") => Json(json!({
            "engines": [{
                "name": format!("{path}/sales-app"),
                "displayName": "Sales",
                "solutionType": "SOLUTION_TYPE_CHAT"
            }]
        }))
        .into_response(),
        Some(other) => google_error(StatusCode::BAD_REQUEST, &format!("bad page token {other}")),
    }
}

async fn list_reasoning_engines(
    State(fake): Shared,
    Path((project, location)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("projects/{project}/locations/{location}/reasoningEngines");
    fake.record("GET", path.clone(), &headers);
    Json(json!({
        "reasoningEngines": [
            {
                "name": format!("{path}/111"),
                "displayName": "travel-agent",
                "createTime": "2025-03-04T05:06:07.891011Z",
                "updateTime": "2025-03-05T00:00:00Z"
            },
            {
                "name": format!("{path}/222"),
                "displayName": "draft"
            }
        ]
    }))
    .into_response()
}

async fn metadata_project(headers: HeaderMap) -> Response {
    if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return StatusCode::FORBIDDEN.into_response();
    }
    "fake-project".into_response()
}

async fn metadata_token(headers: HeaderMap) -> Response {
    if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(json!({"access_token": "metadata-token", "expires_in": 3599, "token_type": "Bearer"}))
        .into_response()
}

/// Start the fake Google APIs on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_google() -> (String, Arc<FakeGoogle>) {
    let fake = Arc::new(FakeGoogle::default());
    let agents = "/v1alpha/projects/{project}/locations/global/collections/default_collection/engines/{app}/assistants/default_assistant/agents";

    let router = Router::new()
        .route(agents, get(list_agents).post(create_agent))
        .route(
            &format!("{agents}/{{id}}"),
            get(get_agent).patch(patch_agent).delete(delete_agent),
        )
        .route(
            "/v1/projects/{project}/locations/{location}/collections/{collection}/engines",
            get(list_engines),
        )
        .route(
            "/v1beta1/projects/{project}/locations/{location}/reasoningEngines",
            get(list_reasoning_engines),
        )
        .route("/computeMetadata/v1/project/project-id", get(metadata_project))
        .route(
            "/computeMetadata/v1/instance/service-accounts/default/token",
            get(metadata_token),
        )
        .with_state(fake.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), fake)
}
