#![allow(dead_code)]

use axum::body::{ to_bytes, Body };
use axum::extract::State;
use axum::http::{ header, HeaderMap, Method, Request, StatusCode, Uri };
use axum::response::IntoResponse;
use axum::Router;
use chat_gateway::config::{ DeploymentConfig, FunctionEndpoint, PayloadLayout, ServiceConfig };
use chat_gateway::server::{ router, AppState };
use serde_json::Value;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tower::ServiceExt;

#[derive(Debug, Clone)]
pub struct Captured {
    pub uri: String,
    pub api_key: Option<String>,
    pub function_key: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// A fake upstream that answers every POST with the same status and body
/// and records what it was sent.
pub struct MockUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Captured>>>,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Duration,
    requests: Arc<Mutex<Vec<Captured>>>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn capture(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: String
) -> impl IntoResponse {
    state.requests
        .lock()
        .unwrap()
        .push(Captured {
            uri: uri.to_string(),
            api_key: header_value(&headers, "api-key"),
            function_key: header_value(&headers, "x-functions-key"),
            authorization: header_value(&headers, "authorization"),
            body: serde_json::from_str(&body).unwrap_or(Value::Null),
        });
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, [(header::CONTENT_TYPE, "application/json")], state.body.clone())
}

impl MockUpstream {
    pub async fn start(status: StatusCode, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: StatusCode, body: &str, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body: body.to_string(),
            delay,
            requests: requests.clone(),
        };
        let app = Router::new().fallback(capture).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock upstream listener should bind");
        let bind_addr = listener.local_addr().expect("mock upstream local address should exist");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream should run");
        });

        Self {
            base_url: format!("http://{bind_addr}"),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn deployment(label: &str, endpoint: &str) -> DeploymentConfig {
    DeploymentConfig::new(
        label,
        Some(endpoint.to_string()),
        Some("gpt-4o".to_string()),
        Some("2024-02-15-preview".to_string()),
        Some("upstream-key".to_string())
    )
}

pub fn base_config() -> ServiceConfig {
    ServiceConfig {
        general: DeploymentConfig::new("Azure OpenAI", None, None, None, None),
        brokerage: DeploymentConfig::new("Brokerage OpenAI", None, None, None, None),
        conversation_function: None,
        mirror_function: None,
        upstream_timeout: Duration::from_secs(5),
        environment: "test".to_string(),
        public_api_url: String::new(),
    }
}

pub fn function(url: String, key: Option<&str>, layout: PayloadLayout) -> FunctionEndpoint {
    FunctionEndpoint { url, key: key.map(str::to_owned), layout }
}

pub fn app(config: ServiceConfig) -> Router {
    router(AppState::new(config).expect("state should build"))
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
    extra_headers: &[(&str, &str)]
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request should build");

    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response should be JSON")
    };
    (status, json)
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), &[]).await
}
