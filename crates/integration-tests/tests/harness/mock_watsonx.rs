//! Mock watsonx.ai backend for integration tests
//!
//! Serves the IAM token endpoint plus the one-shot and streaming chat
//! endpoints with canned responses

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json, Router, routing};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::config::{TEST_API_KEY, TEST_MODEL};

const API_KEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";
const MOCK_TOKEN: &str = "mock-bearer-token";

/// Shape of the SSE body served by the streaming endpoint
#[derive(Debug, Clone, Copy)]
pub enum StreamScript {
    /// "Hello from mock watsonx" in four fragments, then `stop`
    Text,
    /// One `get_weather` call split across three chunks, then `tool_calls`
    ToolCall,
    /// One fragment, then nothing for a long time
    Stalled,
    /// One fragment, then an undecodable payload
    Garbage,
}

/// Mock watsonx.ai backend with predictable responses
pub struct MockWatsonx {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    token_count: AtomicU32,
    chat_count: AtomicU32,
    stream_count: AtomicU32,
    /// Number of chat requests to fail before succeeding
    fail_count: AtomicU32,
    stream_script: StreamScript,
    last_request: Mutex<Option<Value>>,
    last_version: Mutex<Option<String>>,
}

impl MockWatsonx {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, StreamScript::Text).await
    }

    /// Start a mock server that fails the first `n` chat requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, StreamScript::Text).await
    }

    /// Start a mock server whose streaming endpoint follows `script`
    pub async fn start_streaming(script: StreamScript) -> anyhow::Result<Self> {
        Self::start_inner(0, script).await
    }

    async fn start_inner(fail_count: u32, stream_script: StreamScript) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            token_count: AtomicU32::new(0),
            chat_count: AtomicU32::new(0),
            stream_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            stream_script,
            last_request: Mutex::new(None),
            last_version: Mutex::new(None),
        });

        let app = Router::new()
            .route("/identity/token", routing::post(handle_token))
            .route("/ml/v1/text/chat", routing::post(handle_chat))
            .route("/ml/v1/text/chat_stream", routing::post(handle_chat_stream))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL serving both the IAM and the chat endpoints
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of IAM token requests received
    pub fn token_count(&self) -> u32 {
        self.state.token_count.load(Ordering::Relaxed)
    }

    /// Number of one-shot chat requests received
    pub fn chat_count(&self) -> u32 {
        self.state.chat_count.load(Ordering::Relaxed)
    }

    /// Number of streaming chat requests received
    pub fn stream_count(&self) -> u32 {
        self.state.stream_count.load(Ordering::Relaxed)
    }

    /// Body of the most recent authorised chat request
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }

    /// `version` query parameter of the most recent authorised chat request
    pub fn last_version(&self) -> Option<String> {
        self.state.last_version.lock().unwrap().clone()
    }
}

impl Drop for MockWatsonx {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    fn record(&self, version: String, body: Value) {
        *self.last_version.lock().unwrap() = Some(version);
        *self.last_request.lock().unwrap() = Some(body);
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
struct TokenRequest {
    grant_type: String,
    apikey: String,
}

#[derive(Debug, Deserialize)]
struct VersionQuery {
    version: String,
}

// -- Handlers --

async fn handle_token(State(state): State<Arc<MockState>>, Form(req): Form<TokenRequest>) -> Response {
    state.token_count.fetch_add(1, Ordering::Relaxed);

    if req.grant_type != API_KEY_GRANT || req.apikey != TEST_API_KEY {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "errorCode": "BXNIM0415E",
                "errorMessage": "Provided API key could not be found."
            })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": MOCK_TOKEN,
        "refresh_token": "not_supported",
        "token_type": "Bearer",
        "expires_in": 3600,
        "expiration": 1_700_003_600
    }))
    .into_response()
}

/// Reject requests that do not carry the mock bearer token
fn unauthorised(headers: &HeaderMap) -> Option<Response> {
    let expected = format!("Bearer {MOCK_TOKEN}");
    let authorised = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);

    (!authorised).then(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "errors": [{"code": "authentication_token_not_valid", "message": "Failed to authenticate the request"}],
                "trace": "mock-trace",
                "status_code": 401
            })),
        )
            .into_response()
    })
}

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    Query(query): Query<VersionQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.chat_count.fetch_add(1, Ordering::Relaxed);

    if let Some(rejection) = unauthorised(&headers) {
        return rejection;
    }

    let wants_tool = offers_tools(&body) && !answers_tool_call(&body);
    state.record(query.version, body);

    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "errors": [{"code": "internal_error", "message": "mock server intentional failure"}],
                "trace": "mock-trace",
                "status_code": 500
            })),
        )
            .into_response();
    }

    let (message, finish_reason) = if wants_tool {
        (
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "chatcmpl-tool-1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"NY\"}"}
                }]
            }),
            "tool_calls",
        )
    } else {
        (
            json!({"role": "assistant", "content": "Hello from mock watsonx"}),
            "stop",
        )
    };

    Json(json!({
        "id": "chat-mock-1",
        "model_id": TEST_MODEL,
        "created": 1_700_000_000,
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

async fn handle_chat_stream(
    State(state): State<Arc<MockState>>,
    Query(query): Query<VersionQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.stream_count.fetch_add(1, Ordering::Relaxed);

    if let Some(rejection) = unauthorised(&headers) {
        return rejection;
    }

    state.record(query.version, body);

    let body = match state.stream_script {
        StreamScript::Text => Body::from(sse_body(&text_chunks())),
        StreamScript::ToolCall => Body::from(sse_body(&tool_call_chunks())),
        StreamScript::Garbage => {
            let mut raw = sse_body(&text_chunks()[..2]);
            raw.push_str("id: 3\nevent: message\ndata: {not json\n\n");
            Body::from(raw)
        }
        StreamScript::Stalled => {
            let first = Bytes::from(sse_body(&text_chunks()[..2]));
            let rest = Bytes::from(sse_body(&text_chunks()[2..]));
            let chunks = stream::once(async move { Ok::<_, Infallible>(first) }).chain(stream::once(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(rest)
            }));
            Body::from_stream(chunks)
        }
    };

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

// -- Canned bodies --

fn offers_tools(body: &Value) -> bool {
    body["tools"].as_array().is_some_and(|tools| !tools.is_empty())
}

fn answers_tool_call(body: &Value) -> bool {
    body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .is_some_and(|last| last["role"] == "tool")
}

fn stream_chunk(delta: Value, finish_reason: Option<&str>) -> Value {
    let mut choice = json!({"index": 0, "delta": delta});
    if let Some(reason) = finish_reason {
        choice["finish_reason"] = json!(reason);
    }

    json!({
        "id": "chat-mock-stream",
        "model_id": TEST_MODEL,
        "created": 1_700_000_000,
        "choices": [choice]
    })
}

fn text_chunks() -> Vec<Value> {
    let mut chunks = vec![stream_chunk(json!({"role": "assistant", "content": ""}), None)];
    chunks.extend(
        ["Hello", " from", " mock", " watsonx"]
            .into_iter()
            .map(|fragment| stream_chunk(json!({"content": fragment}), None)),
    );
    chunks.push(stream_chunk(json!({"content": ""}), Some("stop")));
    chunks
}

fn tool_call_chunks() -> Vec<Value> {
    vec![
        stream_chunk(
            json!({"role": "assistant", "tool_calls": [{
                "index": 0,
                "id": "chatcmpl-tool-1",
                "type": "function",
                "function": {"name": "get_", "arguments": ""}
            }]}),
            None,
        ),
        stream_chunk(
            json!({"tool_calls": [{"index": 0, "function": {"name": "weather", "arguments": "{\"city\":"}}]}),
            None,
        ),
        stream_chunk(
            json!({"tool_calls": [{"index": 0, "function": {"arguments": "\"NY\"}"}}]}),
            None,
        ),
        stream_chunk(json!({}), Some("tool_calls")),
    ]
}

fn sse_body(chunks: &[Value]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("id: {}\nevent: message\ndata: {chunk}\n\n", i + 1))
        .collect()
}
