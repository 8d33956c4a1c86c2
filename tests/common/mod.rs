// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fake registration/user API for integration tests.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use scan_checkin::config::Config;
use scan_checkin::models::{CheckInResult, Credential, CheckInRequest, StoredSession};
use scan_checkin::scan::ResultPresenter;
use scan_checkin::store::MemoryCredentialStore;
use scan_checkin::AppState;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test_api_key";
pub const PASSWORD: &str = "correct horse";

/// Scripted reply for the next request to an endpoint.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

#[allow(dead_code)]
impl Reply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn unauthorized() -> Self {
        Self::new(401, json!({"message": "Unauthorized", "status": "Unauthorized"}))
    }
}

/// A request the fake API received.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Received {
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeState {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub registration_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub registrations: Mutex<Vec<Received>>,
    pub refresh_requests: Mutex<Vec<Received>>,
    pub registration_script: Mutex<VecDeque<Reply>>,
    pub refresh_script: Mutex<VecDeque<Reply>>,
    pub registration_delay: Mutex<Duration>,
    pub refresh_delay: Mutex<Duration>,
}

#[allow(dead_code)]
impl FakeState {
    pub fn script_registration(&self, reply: Reply) {
        self.registration_script.lock().unwrap().push_back(reply);
    }

    pub fn script_refresh(&self, reply: Reply) {
        self.refresh_script.lock().unwrap().push_back(reply);
    }

    pub fn set_registration_delay(&self, delay: Duration) {
        *self.registration_delay.lock().unwrap() = delay;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn registration_count(&self) -> usize {
        self.registration_calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.registrations.lock().unwrap().clone()
    }
}

/// Running fake API.
pub struct FakeApi {
    pub state: Arc<FakeState>,
    pub base_url: String,
}

#[allow(dead_code)]
impl FakeApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .route("/api/v2/users/login", post(login))
            .route("/api/v2/users/refresh", post(refresh))
            .route("/api/v2/events/registration", post(register))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            api_base_url: self.base_url.clone(),
            api_key: API_KEY.to_string(),
            request_timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }

    /// App state over an in-memory store seeded with `session`.
    pub fn app(&self, session: Option<StoredSession>) -> (AppState, Arc<MemoryCredentialStore>) {
        self.app_with_config(self.config(), session)
    }

    pub fn app_with_config(
        &self,
        config: Config,
        session: Option<StoredSession>,
    ) -> (AppState, Arc<MemoryCredentialStore>) {
        let store = Arc::new(match session {
            Some(session) => MemoryCredentialStore::with_session(session),
            None => MemoryCredentialStore::new(),
        });
        let state = AppState::new(config, store.clone()).expect("Failed to build app state");
        (state, store)
    }
}

/// Stored session whose access token expires `expires_in` from now.
#[allow(dead_code)]
pub fn session(access_token: &str, expires_in: ChronoDuration) -> StoredSession {
    StoredSession {
        credential: Credential {
            access_token: access_token.to_string(),
            access_token_expires_at: Utc::now() + expires_in,
            refresh_token: "original-refresh".to_string(),
        },
        profile: json!({"name": "Usher", "role": "admin"}),
    }
}

#[allow(dead_code)]
pub fn valid_session() -> StoredSession {
    session("valid-token", ChronoDuration::hours(1))
}

#[allow(dead_code)]
pub fn expired_session() -> StoredSession {
    session("stale-token", -ChronoDuration::minutes(10))
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Presenter that records what it was asked to show.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingPresenter {
    pub submitting: Vec<CheckInRequest>,
    pub results: Vec<CheckInResult>,
    pub expired: bool,
}

impl ResultPresenter for RecordingPresenter {
    async fn show_result(&mut self, result: &CheckInResult) {
        self.results.push(result.clone());
    }

    fn show_submitting(&mut self, request: &CheckInRequest) {
        self.submitting.push(request.clone());
    }

    fn session_expired(&mut self) {
        self.expired = true;
    }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

fn received(headers: &HeaderMap, body: Value) -> Received {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Received {
        authorization: header("authorization"),
        api_key: header("x-api-key"),
        body,
    }
}

fn reply(reply: Reply) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(reply.status).unwrap(),
        Json(reply.body),
    )
}

fn token_set(n: usize) -> Value {
    json!({
        "tokens": [
            {
                "type": "accessToken",
                "token": format!("refreshed-{}", n),
                "expiresAt": (Utc::now() + ChronoDuration::hours(1)).to_rfc3339(),
            },
            {
                "type": "refreshToken",
                "token": format!("rotated-refresh-{}", n),
                "expiresAt": (Utc::now() + ChronoDuration::days(30)).to_rfc3339(),
            }
        ]
    })
}

async fn login(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-api-key").is_none() {
        return reply(Reply::new(403, json!({"message": "Missing API key"})));
    }
    if body["password"] != PASSWORD {
        return reply(Reply::unauthorized());
    }

    let mut response = token_set(0);
    response["name"] = json!("Usher");
    response["email"] = body["identifier"].clone();
    reply(Reply::new(200, response))
}

async fn refresh(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    state
        .refresh_requests
        .lock()
        .unwrap()
        .push(received(&headers, body));

    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let scripted = state.refresh_script.lock().unwrap().pop_front();
    reply(scripted.unwrap_or_else(|| Reply::new(200, token_set(n))))
}

async fn register(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.registration_calls.fetch_add(1, Ordering::SeqCst);
    let now_in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state
        .max_in_flight
        .fetch_max(now_in_flight, Ordering::SeqCst);

    let community_id = body["communityId"].as_str().unwrap_or_default().to_string();
    state
        .registrations
        .lock()
        .unwrap()
        .push(received(&headers, body));

    let delay = *state.registration_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let scripted = state.registration_script.lock().unwrap().pop_front();
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    reply(scripted.unwrap_or_else(|| {
        Reply::new(
            200,
            json!({"name": format!("Registrant {}", community_id), "status": "active"}),
        )
    }))
}
