//! Mock chat-completion upstream for integration tests.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use led_assist::{
    config::{
        Config, DEFAULT_SYSTEM_PROMPT, GatewayConfig, HistoryConfig, HttpConfig, LlmConfig,
        OpenAiConfig,
    },
    gateway::QueryGateway,
    http::AppState,
};

/// Shipped request defaults aimed at `api_base_url`, with a short timeout.
pub fn upstream_config(api_base_url: impl Into<String>, api_key: Option<&str>) -> Config {
    Config {
        app_name: "test".into(),
        log_level: "info".into(),
        http: HttpConfig { bind: "127.0.0.1:0".into() },
        llm: LlmConfig {
            provider: "openai-compatible".into(),
            api_key_env: "GROQ_API_KEY".into(),
            openai: OpenAiConfig {
                api_base_url: api_base_url.into(),
                model: "llama-3.1-8b-instant".into(),
                temperature: 0.7,
                max_tokens: 1024,
                timeout_seconds: 5,
            },
        },
        gateway: GatewayConfig { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() },
        history: HistoryConfig { capacity: 100, default_limit: 10 },
        llm_api_key: api_key.map(str::to_string),
    }
}

/// How the mock answers every request.
#[derive(Clone)]
pub enum Behavior {
    /// 200 with `content` as the first choice.
    Answer(String),
    /// Non-2xx with an OpenAI-style error envelope.
    Fail(StatusCode, String),
    /// 200 with a body that is not a completion response.
    Garbage,
    /// Sleep before answering.
    Stall(Duration),
}

struct MockState {
    behavior: Behavior,
    hits: AtomicUsize,
    last_body: Mutex<Option<Value>>,
    last_auth: Mutex<Option<String>>,
}

pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(MockState {
            behavior,
            hits: AtomicUsize::new(0),
            last_body: Mutex::new(None),
            last_auth: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, _handle: handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.state.last_auth.lock().unwrap().clone()
    }

    /// Gateway wired to this upstream, with `api_key` as the credential.
    pub fn gateway(&self, api_key: Option<&str>) -> Arc<QueryGateway> {
        let config = upstream_config(self.url(), api_key);
        Arc::new(QueryGateway::from_config(&config).unwrap())
    }

    pub fn app_state(&self, api_key: Option<&str>) -> AppState {
        AppState::new(self.gateway(api_key), 10)
    }
}

async fn chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match &state.behavior {
        Behavior::Answer(content) => Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "llama-3.1-8b-instant",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Behavior::Fail(status, message) => (
            *status,
            Json(json!({ "error": { "message": message, "code": "test_failure" } })),
        )
            .into_response(),
        Behavior::Garbage => (StatusCode::OK, "definitely not json").into_response(),
        Behavior::Stall(delay) => {
            tokio::time::sleep(*delay).await;
            Json(json!({ "choices": [{ "message": { "content": "too late" } }] })).into_response()
        }
    }
}
