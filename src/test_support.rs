//! In-process fake backend for service tests.
//!
//! Serves the REST surface the client talks to on `127.0.0.1:0`, keeps its
//! data in a shared `FakeState`, and issues real session cookies so tests
//! go through the same HTTP and cookie-jar paths as production.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::http::{ApiClient, SESSION_COOKIE_NAME};
use crate::types::{Chat, CreateChat, CreateInviteCode, InviteCode, UserReference};

pub(crate) const PASSWORD: &str = "Secret123!";
pub(crate) const ADMIN_EMAIL: &str = "admin@example.test";
pub(crate) const USER_EMAIL: &str = "student@example.test";

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub roles: BTreeSet<String>,
}

impl Account {
    pub(crate) fn new(email: &str, roles: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password: PASSWORD.to_owned(),
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
        }
    }

    fn reference(&self) -> UserReference {
        UserReference { id: self.id, email: self.email.clone() }
    }
}

/// Canned error response for one endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Failure {
    pub status: u16,
    pub body: String,
    pub json: bool,
}

impl Failure {
    pub(crate) fn empty(status: u16) -> Self {
        Self { status, body: String::new(), json: false }
    }

    pub(crate) fn text(status: u16, body: &str) -> Self {
        Self { status, body: body.to_owned(), json: false }
    }

    pub(crate) fn json(status: u16, body: &Value) -> Self {
        Self { status, body: body.to_string(), json: true }
    }

    fn response(&self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = if self.json { "application/json" } else { "text/plain; charset=utf-8" };
        (status, [(header::CONTENT_TYPE, content_type)], self.body.clone()).into_response()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub accounts: Vec<Account>,
    /// Session token -> account id.
    pub sessions: HashMap<String, Uuid>,
    pub chats: Vec<Chat>,
    /// Chat id -> backend message DTOs.
    pub messages: HashMap<Uuid, Vec<Value>>,
    pub invite_codes: Vec<InviteCode>,
    pub reply_chunks: Vec<Vec<u8>>,
    /// Abort the reply body after the last chunk instead of closing it cleanly.
    /// Chunks are paced so headers and earlier chunks reach the client first.
    pub reply_breaks: bool,
    /// Endpoint key -> canned failure. Keys: `me`, `register`, `logout`,
    /// `users`, `promote`, `invite-codes:list`, `invite-codes:create`,
    /// `invite-codes:delete`, `chat:delete`, `complete`.
    pub failures: HashMap<&'static str, Failure>,
    pub login_calls: Vec<String>,
    pub logout_calls: usize,
    pub me_calls: usize,
    pub last_message: Option<Value>,
    pub last_problems_query: Option<HashMap<String, String>>,
}

impl FakeState {
    /// One admin and one regular user, both with [`PASSWORD`].
    pub(crate) fn seeded() -> Self {
        Self {
            accounts: vec![Account::new(ADMIN_EMAIL, &["Admin", "User"]), Account::new(USER_EMAIL, &["User"])],
            ..Self::default()
        }
    }

    pub(crate) fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    fn failure(&self, key: &str) -> Option<Response> {
        self.failures.get(key).map(Failure::response)
    }

    fn current(&self, headers: &HeaderMap) -> Option<&Account> {
        let token = session_token(headers)?;
        let id = self.sessions.get(&token)?;
        self.accounts.iter().find(|a| a.id == *id)
    }

    fn require_user(&self, headers: &HeaderMap) -> Result<&Account, Response> {
        self.current(headers).ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<&Account, Response> {
        let account = self.require_user(headers)?;
        if account.roles.contains("Admin") {
            Ok(account)
        } else {
            Err(StatusCode::FORBIDDEN.into_response())
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.to_owned())
}

// =============================================================================
// SERVER
// =============================================================================

type Shared = Arc<Mutex<FakeState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, FakeState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct FakeBackend {
    pub base_url: String,
    shared: Shared,
}

impl FakeBackend {
    pub(crate) async fn start(state: FakeState) -> Self {
        let shared = Arc::new(Mutex::new(state));
        let app = routes(Arc::clone(&shared));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("fake backend should bind");
        let addr = listener.local_addr().expect("fake backend should have an address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend failed");
        });
        Self { base_url: format!("http://{addr}"), shared }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.shared)
    }

    pub(crate) fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).expect("fake backend address should parse")
    }

    pub(crate) fn api(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("client should build")
    }
}

fn routes(shared: Shared) -> Router {
    Router::new()
        .route("/api/Auth/me", get(me))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/Auth/logout", post(logout))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/promote", post(promote))
        .route("/api/admin/invite-codes", get(list_invite_codes).post(create_invite_code))
        .route("/api/admin/invite-codes/{id}", delete(delete_invite_code))
        .route("/api/chat/create", post(create_chat))
        .route("/api/chat/delete/{id}", post(delete_chat))
        .route("/api/chat/get", get(list_chats))
        .route("/api/Message/complete", post(complete))
        .route("/api/Message/get-messages-from-chat", get(chat_messages))
        .route("/api/Tasks/problems", get(problems))
        .with_state(shared)
}

// =============================================================================
// AUTH HANDLERS
// =============================================================================

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Registration {
    email: String,
    password: String,
    #[allow(dead_code)]
    invite_code: String,
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shared);
    state.me_calls += 1;
    if let Some(failure) = state.failure("me") {
        return failure;
    }
    match state.current(&headers) {
        Some(a) => Json(json!({ "id": a.id, "email": a.email, "roles": a.roles })).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn login(State(shared): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut state = lock(&shared);
    state.login_calls.push(body.email.clone());
    let Some(id) = state
        .accounts
        .iter()
        .find(|a| a.email == body.email && a.password == body.password)
        .map(|a| a.id)
    else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let token = Uuid::new_v4().simple().to_string();
    state.sessions.insert(token.clone(), id);
    let cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly");
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], "").into_response()
}

async fn register(State(shared): State<Shared>, Json(body): Json<Registration>) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("register") {
        return failure;
    }
    if state.account(&body.email).is_some() {
        return Failure::json(
            400,
            &json!({
                "title": "One or more validation errors occurred.",
                "status": 400,
                "errors": { "DuplicateUserName": [format!("Username '{}' is already taken.", body.email)] }
            }),
        )
        .response();
    }
    let mut account = Account::new(&body.email, &["User"]);
    account.password = body.password;
    state.accounts.push(account);
    StatusCode::OK.into_response()
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shared);
    state.logout_calls += 1;
    if let Some(failure) = state.failure("logout") {
        return failure;
    }
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(&token);
    }
    let cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0");
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], "").into_response()
}

// =============================================================================
// ADMIN HANDLERS
// =============================================================================

async fn list_users(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&shared);
    if let Some(failure) = state.failure("users") {
        return failure;
    }
    if let Err(rejection) = state.require_admin(&headers) {
        return rejection;
    }
    let users: Vec<Value> = state
        .accounts
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "email": a.email,
                "emailConfirmed": true,
                "lockoutEnabled": false,
                "lockoutEnd": null,
                "roles": a.roles,
                "usedInviteCode": null
            })
        })
        .collect();
    Json(users).into_response()
}

async fn promote(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("promote") {
        return failure;
    }
    if let Err(rejection) = state.require_admin(&headers) {
        return rejection;
    }
    let Some(user_id) = query.get("userId").and_then(|id| id.parse::<Uuid>().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.accounts.iter_mut().find(|a| a.id == user_id) {
        Some(account) => {
            account.roles.insert("Admin".to_owned());
            StatusCode::OK.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_invite_codes(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&shared);
    if let Some(failure) = state.failure("invite-codes:list") {
        return failure;
    }
    if let Err(rejection) = state.require_admin(&headers) {
        return rejection;
    }
    Json(state.invite_codes.clone()).into_response()
}

async fn create_invite_code(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateInviteCode>,
) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("invite-codes:create") {
        return failure;
    }
    let creator = match state.require_admin(&headers) {
        Ok(account) => account.reference(),
        Err(rejection) => return rejection,
    };
    if state.invite_codes.iter().any(|c| c.code == body.code) {
        return Failure::text(400, "Invite code already exists").response();
    }
    let code = InviteCode {
        id: Uuid::new_v4(),
        code: body.code,
        max_usages: body.max_usages,
        current_usages: 0,
        created_at: "2025-03-01T10:00:00Z".to_owned(),
        created_by: creator,
        used_by: Vec::new(),
    };
    state.invite_codes.push(code.clone());
    Json(code).into_response()
}

async fn delete_invite_code(State(shared): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("invite-codes:delete") {
        return failure;
    }
    if let Err(rejection) = state.require_admin(&headers) {
        return rejection;
    }
    let before = state.invite_codes.len();
    state.invite_codes.retain(|c| c.id != id);
    if state.invite_codes.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn create_chat(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<CreateChat>) -> Response {
    let mut state = lock(&shared);
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    let chat = Chat { id: Uuid::new_v4(), name: body.name, kind: body.kind };
    let id = chat.id;
    state.chats.push(chat);
    Json(json!({ "id": id })).into_response()
}

async fn delete_chat(State(shared): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("chat:delete") {
        return failure;
    }
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    let before = state.chats.len();
    state.chats.retain(|c| c.id != id);
    if state.chats.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::OK.into_response()
    }
}

async fn list_chats(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&shared);
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    Json(state.chats.clone()).into_response()
}

async fn chat_messages(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = lock(&shared);
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    let Some(chat_id) = query.get("chatId").and_then(|id| id.parse::<Uuid>().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    Json(state.messages.get(&chat_id).cloned().unwrap_or_default()).into_response()
}

async fn complete(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut state = lock(&shared);
    if let Some(failure) = state.failure("complete") {
        return failure;
    }
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    state.last_message = Some(body);
    let mut items: Vec<Result<Vec<u8>, std::io::Error>> = state.reply_chunks.iter().cloned().map(Ok).collect();
    if state.reply_breaks {
        items.push(Err(std::io::Error::other("model backend crashed")));
    }
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(futures::stream::iter(items).then(|item| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            item
        })),
    )
        .into_response()
}

async fn problems(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = lock(&shared);
    if let Err(rejection) = state.require_user(&headers) {
        return rejection;
    }
    state.last_problems_query = Some(query);
    Json(json!({
        "items": [{ "name": "quadratic-roots", "difficulty": 2 }],
        "totalCount": 1
    }))
    .into_response()
}
