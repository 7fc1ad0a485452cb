//! Test doubles: a scripted transport and an in-memory backup API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use crate::errors::ClientError;
use crate::models::{EntityId, Game};
use crate::transport::{HttpTransport, Method, NormalizedResult, ResponseBody, Transport};

pub(crate) fn game(id: i64, name: &str) -> Game {
    Game {
        id: EntityId::from(id),
        name: name.to_string(),
        game_path: format!("/saves/{}", id),
        backup_root: format!("/backups/{}", id),
        last_backup_at: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn reply(status: u16, body: Value) -> NormalizedResult {
    NormalizedResult {
        succeeded: (200..300).contains(&status),
        status,
        body: ResponseBody::Json(body),
    }
}

pub(crate) fn ok(body: Value) -> NormalizedResult {
    reply(200, body)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) payload: Option<Value>,
}

enum Scripted {
    Reply(NormalizedResult),
    Unreachable,
}

/// Answers from a script, then with an empty `{data: []}` list.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, result: NormalizedResult) -> Self {
        self.script.lock().unwrap().push_back(Scripted::Reply(result));
        self
    }

    /// The next scripted answer is a connection failure.
    pub(crate) fn fail_next(self) -> Self {
        self.script.lock().unwrap().push_back(Scripted::Unreachable);
        self
    }

    /// Park the first request until the returned handle is notified.
    pub(crate) fn hold_first(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
    ) -> Result<NormalizedResult, ClientError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            payload,
        });

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(result)) => Ok(result),
            Some(Scripted::Unreachable) => {
                Err(ClientError::Transport("connection refused".to_string()))
            }
            None => Ok(ok(json!({ "data": [] }))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct StoredGame {
    id: i64,
    name: String,
    game_path: String,
    backup_root: String,
    last_backup_at: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
struct StoredBackup {
    id: i64,
    game_id: i64,
    name: String,
    backup_path: String,
    created_at: String,
    size_bytes: u64,
}

#[derive(Default)]
struct Store {
    games: Vec<StoredGame>,
    backups: Vec<StoredBackup>,
    next_game_id: i64,
    next_backup_id: i64,
    backup_failure: Option<String>,
}

impl Store {
    fn insert_game(&mut self, name: &str, game_path: &str, backup_root: &str) -> StoredGame {
        self.next_game_id += 1;
        let now = chrono::Utc::now().to_rfc3339();
        let game = StoredGame {
            id: self.next_game_id,
            name: name.to_string(),
            game_path: game_path.to_string(),
            backup_root: backup_root.to_string(),
            last_backup_at: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.games.push(game.clone());
        game
    }

    fn insert_backup(&mut self, game_id: i64, name: Option<&str>) -> Option<StoredBackup> {
        let now = chrono::Utc::now();
        let game = self.games.iter_mut().find(|g| g.id == game_id)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => now.format("%Y%m%d_%H%M%S").to_string(),
        };
        self.next_backup_id += 1;
        let backup = StoredBackup {
            id: self.next_backup_id,
            game_id,
            backup_path: format!("{}/{}", game.backup_root, name),
            name,
            created_at: now.to_rfc3339(),
            size_bytes: 4096,
        };
        game.last_backup_at = Some(backup.created_at.clone());
        self.backups.push(backup.clone());
        Some(backup)
    }
}

/// One request as the fake API saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeState {
    store: Arc<Mutex<Store>>,
}

type ApiReply = (StatusCode, Json<Value>);

fn data(status: StatusCode, value: impl Serialize) -> ApiReply {
    (status, Json(json!({ "data": value })))
}

fn error(status: StatusCode, code: &str, message: &str) -> ApiReply {
    (status, Json(json!({ "code": code, "message": message, "details": null })))
}

fn filled<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_games(State(state): State<FakeState>) -> ApiReply {
    let store = state.store.lock().unwrap();
    data(StatusCode::OK, &store.games)
}

async fn create_game(State(state): State<FakeState>, Json(body): Json<Value>) -> ApiReply {
    let (Some(name), Some(game_path), Some(backup_root)) = (
        filled(&body, "name"),
        filled(&body, "game_path"),
        filled(&body, "backup_root"),
    ) else {
        return error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "name, game_path and backup_root are required",
        );
    };
    let game = state
        .store
        .lock()
        .unwrap()
        .insert_game(name, game_path, backup_root);
    data(StatusCode::CREATED, game)
}

async fn update_game(
    State(state): State<FakeState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiReply {
    let mut store = state.store.lock().unwrap();
    let Some(game) = store.games.iter_mut().find(|g| g.id == id) else {
        return error(StatusCode::NOT_FOUND, "not_found", "game not found");
    };
    let mut changed = false;
    if let Some(name) = filled(&body, "name") {
        game.name = name.to_string();
        changed = true;
    }
    if let Some(path) = filled(&body, "game_path") {
        game.game_path = path.to_string();
        changed = true;
    }
    if let Some(root) = filled(&body, "backup_root") {
        game.backup_root = root.to_string();
        changed = true;
    }
    if !changed {
        return error(StatusCode::BAD_REQUEST, "validation_error", "no fields to update");
    }
    game.updated_at = chrono::Utc::now().to_rfc3339();
    data(StatusCode::OK, game.clone())
}

async fn run_backup(
    State(state): State<FakeState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiReply {
    let mut store = state.store.lock().unwrap();
    if let Some(message) = store.backup_failure.clone() {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "backup_failed", &message);
    }
    let name = body.get("name").and_then(Value::as_str);
    match store.insert_backup(id, name) {
        Some(backup) => data(StatusCode::CREATED, backup),
        None => error(StatusCode::NOT_FOUND, "not_found", "game not found"),
    }
}

async fn list_backups(State(state): State<FakeState>, Path(id): Path<i64>) -> ApiReply {
    let store = state.store.lock().unwrap();
    if !store.games.iter().any(|g| g.id == id) {
        return error(StatusCode::NOT_FOUND, "not_found", "game not found");
    }
    let mut backups: Vec<&StoredBackup> =
        store.backups.iter().filter(|b| b.game_id == id).collect();
    backups.sort_by(|a, b| b.id.cmp(&a.id));
    data(StatusCode::OK, backups)
}

async fn restore_latest(State(state): State<FakeState>, Path(id): Path<i64>) -> ApiReply {
    let store = state.store.lock().unwrap();
    match store.backups.iter().filter(|b| b.game_id == id).max_by_key(|b| b.id) {
        Some(backup) => data(StatusCode::OK, backup),
        None => error(StatusCode::NOT_FOUND, "not_found", "no backups for this game"),
    }
}

async fn restore_backup(
    State(state): State<FakeState>,
    Path((id, backup_id)): Path<(i64, i64)>,
) -> ApiReply {
    let store = state.store.lock().unwrap();
    match store
        .backups
        .iter()
        .find(|b| b.id == backup_id && b.game_id == id)
    {
        Some(backup) => data(StatusCode::OK, backup),
        None => error(StatusCode::NOT_FOUND, "not_found", "backup not found"),
    }
}

async fn delete_backup(
    State(state): State<FakeState>,
    Path((id, backup_id)): Path<(i64, i64)>,
) -> ApiReply {
    let mut store = state.store.lock().unwrap();
    let before = store.backups.len();
    store
        .backups
        .retain(|b| !(b.id == backup_id && b.game_id == id));
    if store.backups.len() == before {
        return error(StatusCode::NOT_FOUND, "not_found", "backup not found");
    }
    data(StatusCode::OK, json!({ "deleted": true }))
}

async fn record_call(
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    calls.lock().unwrap().push(RecordedCall {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        body: serde_json::from_slice(&bytes).ok(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn fake_router(state: FakeState, calls: Arc<Mutex<Vec<RecordedCall>>>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/games", get(list_games).post(create_game))
        .route("/api/v1/games/{id}", patch(update_game))
        .route("/api/v1/games/{id}/backup", post(run_backup))
        .route("/api/v1/games/{id}/backups", get(list_backups))
        .route("/api/v1/games/{id}/backups/{backup_id}", delete(delete_backup))
        .route("/api/v1/games/{id}/restore/latest", post(restore_latest))
        .route("/api/v1/games/{id}/restore/{backup_id}", post(restore_backup))
        .layer(middleware::from_fn(move |req, next| {
            record_call(calls.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The backup API served from memory on a random local port.
pub(crate) struct FakeApi {
    pub(crate) base_url: String,
    state: FakeState,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeApi {
    pub(crate) async fn start() -> Self {
        let state = FakeState::default();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let app = fake_router(state.clone(), calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeApi {
            base_url: format!("http://{}", addr),
            state,
            calls,
        }
    }

    pub(crate) fn transport(&self) -> HttpTransport {
        HttpTransport::new(self.base_url.clone())
    }

    pub(crate) fn seed_game(&self, name: &str, game_path: &str, backup_root: &str) -> i64 {
        self.state
            .store
            .lock()
            .unwrap()
            .insert_game(name, game_path, backup_root)
            .id
    }

    pub(crate) fn seed_backup(&self, game_id: i64, name: &str) -> i64 {
        self.state
            .store
            .lock()
            .unwrap()
            .insert_backup(game_id, Some(name))
            .expect("seeded backup needs a seeded game")
            .id
    }

    /// Make every backup request fail with a 500 carrying `message`.
    pub(crate) fn fail_backups_with(&self, message: &str) {
        self.state.store.lock().unwrap().backup_failure = Some(message.to_string());
    }

    pub(crate) fn backup_count(&self, game_id: i64) -> usize {
        self.state
            .store
            .lock()
            .unwrap()
            .backups
            .iter()
            .filter(|b| b.game_id == game_id)
            .count()
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}
