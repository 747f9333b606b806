#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use quiz_api::{
    config::{AuthConfig, Config, RelayConfig, StorageConfig},
    create_router,
    models::RelayMessage,
    services::{
        catalog_service::{IdentityCatalog, PersonaCatalog, QuestionCatalog},
        relay_service::{AssistantRelay, RelayError},
        snapshot_service::SnapshotManager,
        state_store::StateStore,
        AppState,
    },
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const COOKIE_NAME: &str = "quiz_token";

/// Assistant stand-in: echoes the last user message and records every call.
#[derive(Default)]
pub struct StubRelay {
    pub calls: Mutex<Vec<Vec<RelayMessage>>>,
    pub fail: bool,
}

#[async_trait]
impl AssistantRelay for StubRelay {
    async fn relay(&self, messages: Vec<RelayMessage>) -> Result<String, RelayError> {
        let last = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(messages);
        if self.fail {
            return Err(RelayError::Status {
                status: 503,
                body: "upstream down".to_string(),
            });
        }
        Ok(format!("echo: {}", last))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub relay: Arc<StubRelay>,
    pub dir: PathBuf,
    owns_dir: bool,
}

impl TestApp {
    pub fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if self.owns_dir {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }
}

pub fn test_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quiz-api-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_fixtures(dir: &PathBuf) {
    let questions = json!([
        {"id": 1, "answer": "Paris", "score": 10, "penalty": 5, "penalty_try_count": 2},
        {"id": 2, "answer": "Tehran", "score": 4, "penalty": 3, "penalty_try_count": 1},
        {"id": 3, "answer": "Simorgh", "score": 20, "penalty": 0, "penalty_try_count": 1,
         "per_user_answers": {"zal": "Zal's bird"}},
        {"id": 0, "answer": "skipped"}
    ]);
    let users = json!([
        {"username": "rostam", "password": "rakhsh"},
        {"username": "zal", "password": "simorgh"},
        {"username": "", "password": "nobody"}
    ]);
    let personas = json!([
        {"id": 1, "prompt": "You are Guido, a friendly mechanic."},
        {"id": 2, "prompt": "You are the wizard."}
    ]);

    std::fs::write(dir.join("questions.json"), questions.to_string()).unwrap();
    std::fs::write(dir.join("users.json"), users.to_string()).unwrap();
    std::fs::write(dir.join("personas.json"), personas.to_string()).unwrap();
}

pub fn test_config(dir: &PathBuf) -> Config {
    let path = |name: &str| dir.join(name).display().to_string();
    Config {
        server_address: "127.0.0.1:0".to_string(),
        storage: StorageConfig {
            state_path: path("state.json"),
            users_path: path("users.json"),
            questions_path: path("questions.json"),
            personas_path: path("personas.json"),
        },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_seconds: 3600,
            cookie_name: COOKIE_NAME.to_string(),
            cookie_secure: false,
        },
        relay: RelayConfig {
            api_url: "http://127.0.0.1:9/unused".to_string(),
            api_key: String::new(),
            model: "test-model".to_string(),
            timeout_seconds: 1,
        },
        allowed_origins: vec![],
    }
}

/// Builds the router over the fixture files in `dir`, restoring any snapshot
/// already present there. The directory is left in place on drop.
pub async fn create_app_in(dir: PathBuf, relay: Arc<StubRelay>) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = test_config(&dir);
    let questions = QuestionCatalog::load(&config.storage.questions_path)
        .await
        .unwrap();
    let identities = IdentityCatalog::load(&config.storage.users_path)
        .await
        .unwrap();
    let personas = PersonaCatalog::load(&config.storage.personas_path)
        .await
        .unwrap();
    let store = StateStore::restore(SnapshotManager::new(&config.storage.state_path)).await;

    let state = Arc::new(AppState::from_parts(
        config,
        store,
        questions,
        identities,
        personas,
        relay.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        relay,
        dir,
        owns_dir: false,
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_relay(Arc::new(StubRelay::default())).await
}

pub async fn create_test_app_with_relay(relay: Arc<StubRelay>) -> TestApp {
    let dir = test_dir();
    write_fixtures(&dir);
    let mut app = create_app_in(dir, relay).await;
    app.owns_dir = true;
    app
}

/// Logs in and returns the `name=value` cookie pair.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": username, "password": password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "login failed for {}", username);

    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with(&format!("{}=", COOKIE_NAME)))
        .and_then(|c| c.split(';').next())
        .expect("session cookie missing")
        .to_string()
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };

    (status, json)
}

pub async fn submit_answer(
    app: &Router,
    cookie: &str,
    question_id: u32,
    answer: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/submit_answer",
        Some(cookie),
        Some(json!({"question_id": question_id, "answer": answer})),
    )
    .await
}
