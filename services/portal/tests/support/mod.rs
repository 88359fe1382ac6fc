//! An in-process fake of the complaint and auth REST API, served by axum on
//! an ephemeral port. Payloads use the FastAPI service's shapes: `user_id`
//! owners, zone-less timestamps and `{"detail": ...}` errors.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_lib::adapters::{FileSessionStore, HttpPortalClient};
use portal_lib::app::AppState;
use portal_lib::config::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;

/// How the suggestion endpoint answers.
#[derive(Clone, Debug)]
pub enum Suggestion {
    Text(String),
    /// 204 No Content.
    Unavailable,
    /// 500.
    Failing,
}

#[derive(Debug)]
pub struct FakeState {
    pub complaints: Vec<Value>,
    pub users: Vec<Value>,
    pub passwords: HashMap<String, String>,
    pub suggestion: Suggestion,
    pub suggestion_delay: Duration,
    pub complaint_delay: Duration,
    /// Number of upcoming PATCH requests that answer 500.
    pub failing_patches: usize,
    pub patches: Vec<(i64, Value)>,
    /// Answer list queries with every complaint regardless of `user_id`.
    pub ignore_owner_filter: bool,
    pub list_queries: Vec<Option<String>>,
    next_id: i64,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            complaints: Vec::new(),
            users: Vec::new(),
            passwords: HashMap::new(),
            suggestion: Suggestion::Text("Refund the duplicate charge.".to_string()),
            suggestion_delay: Duration::ZERO,
            complaint_delay: Duration::ZERO,
            failing_patches: 0,
            patches: Vec::new(),
            ignore_owner_filter: false,
            list_queries: Vec::new(),
            next_id: 1,
        }
    }
}

pub type Shared = Arc<Mutex<FakeState>>;

pub struct FakeApi {
    pub base_url: String,
    pub state: Shared,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/api/complaints/", get(list_complaints).post(create_complaint))
            .route(
                "/api/complaints/{id}/",
                get(get_complaint).patch(update_complaint),
            )
            .route("/api/complaints/{id}/suggest_resolution/", get(suggest_resolution))
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_user(&self, id: i64, name: &str, email: &str, password: &str, role: &str) {
        self.with(|s| {
            s.users.push(json!({ "id": id, "full_name": name, "email": email, "role": role }));
            s.passwords.insert(email.to_string(), password.to_string());
        });
    }

    /// Seeds a complaint and returns its id.
    pub fn add_complaint(&self, owner: i64, title: &str, status: &str) -> i64 {
        self.with(|s| {
            let id = s.next_id;
            s.next_id += 1;
            s.complaints.push(complaint_json(id, owner, title, "Billing", "It broke.", status));
            id
        })
    }

    pub fn complaint(&self, id: i64) -> Option<Value> {
        self.with(|s| s.complaints.iter().find(|c| c["id"] == id).cloned())
    }

    pub fn client(&self) -> HttpPortalClient {
        HttpPortalClient::new(self.base_url.clone(), Duration::from_secs(5)).unwrap()
    }

    /// Application state wired to this server with its session file at `session_file`.
    pub fn app_state(&self, session_file: &FsPath) -> AppState {
        let config = Config {
            api_base_url: self.base_url.clone(),
            session_file: session_file.to_path_buf(),
            request_timeout: Duration::from_secs(5),
            log_level: Level::INFO,
        };
        let client = Arc::new(self.client());
        AppState::new(
            Arc::new(config),
            client.clone(),
            client,
            Arc::new(FileSessionStore::new(session_file)),
        )
    }
}

fn complaint_json(id: i64, owner: i64, title: &str, category: &str, description: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "user_name": format!("User {}", owner),
        "title": title,
        "description": description,
        "category": category,
        "status": status,
        "priority": "Medium",
        "ai_severity_score": 6,
        "ai_predicted_resolution_time": "2 days",
        "resolution": null,
        "created_at": "2024-05-01 10:00:00.123456",
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

async fn list_complaints(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut s = state.lock().unwrap();
    let owner = query.get("user_id").cloned();
    s.list_queries.push(owner.clone());
    let complaints: Vec<Value> = s
        .complaints
        .iter()
        .filter(|c| match &owner {
            Some(owner) if !s.ignore_owner_filter => c["user_id"].to_string() == *owner,
            _ => true,
        })
        .cloned()
        .collect();
    Json(Value::Array(complaints))
}

async fn create_complaint(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let title = body["title"].as_str().unwrap_or_default();
    if title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "title": ["This field may not be blank."] })),
        )
            .into_response();
    }
    let Some(owner) = body["user_id"].as_i64() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [
                { "loc": ["body", "user_id"], "msg": "value is not a valid integer", "type": "type_error.integer" }
            ] })),
        )
            .into_response();
    };

    let mut s = state.lock().unwrap();
    let id = s.next_id;
    s.next_id += 1;
    let record = complaint_json(
        id,
        owner,
        title,
        body["category"].as_str().unwrap_or_default(),
        body["description"].as_str().unwrap_or_default(),
        "Pending",
    );
    s.complaints.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn get_complaint(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let delay = state.lock().unwrap().complaint_delay;
    tokio::time::sleep(delay).await;
    let s = state.lock().unwrap();
    match s.complaints.iter().find(|c| c["id"] == id) {
        Some(c) => Json(c.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_complaint(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    s.patches.push((id, patch.clone()));
    if s.failing_patches > 0 {
        s.failing_patches -= 1;
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let Some(complaint) = s.complaints.iter_mut().find(|c| c["id"] == id) else {
        return not_found();
    };
    if let Some(fields) = patch.as_object() {
        for (key, value) in fields {
            complaint[key.as_str()] = value.clone();
        }
    }
    complaint["updated_at"] = json!("2024-05-02 09:30:00.250000");
    Json(complaint.clone()).into_response()
}

async fn suggest_resolution(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let delay = state.lock().unwrap().suggestion_delay;
    tokio::time::sleep(delay).await;
    let s = state.lock().unwrap();
    if !s.complaints.iter().any(|c| c["id"] == id) {
        return not_found();
    }
    match &s.suggestion {
        Suggestion::Text(text) => Json(json!({ "suggestion": text })).into_response(),
        Suggestion::Unavailable => StatusCode::NO_CONTENT.into_response(),
        Suggestion::Failing => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut s = state.lock().unwrap();
    if s.passwords.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email already registered" })),
        )
            .into_response();
    }
    let id = 100 + s.users.len() as i64;
    let user = json!({
        "id": id,
        "full_name": body["full_name"],
        "email": email,
        "role": "customer",
    });
    s.users.push(user.clone());
    s.passwords.insert(
        email,
        body["password"].as_str().unwrap_or_default().to_string(),
    );
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email and password are required" })),
        )
            .into_response();
    }
    let s = state.lock().unwrap();
    if s.passwords.get(email).map(String::as_str) != Some(password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials" })),
        )
            .into_response();
    }
    match s.users.iter().find(|u| u["email"] == email) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid credentials" }))).into_response(),
    }
}
