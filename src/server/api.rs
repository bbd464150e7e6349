use crate::config::client::ClientConfig;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::llm::azure::AzureOpenAiProxy;
use crate::llm::AiTarget;
use crate::models::conversation::ConversationRecord;
use crate::store::{ ConversationArchive, SaveReceipt };
use axum::{
    extract::{ rejection::JsonRejection, Path, Request, State },
    http::{ StatusCode, Uri },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use chrono::{ SecondsFormat, Utc };
use log::{ error, info, warn };
use serde::Serialize;
use serde_json::{ json, Value };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{ Duration, Instant };
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServiceConfig>,
    archive: ConversationArchive,
    proxy: AzureOpenAiProxy,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let http = reqwest::Client::builder().timeout(config.upstream_timeout).build()?;
        let archive = ConversationArchive::from_config(&config, http.clone());
        Ok(Self::with_archive(config, archive, http))
    }

    /// Builds state around an existing archive, e.g. one backed by a test double.
    pub fn with_archive(
        config: ServiceConfig,
        archive: ConversationArchive,
        http: reqwest::Client
    ) -> Self {
        Self {
            config: Arc::new(config),
            archive,
            proxy: AzureOpenAiProxy::new(http),
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    environment: String,
    timestamp: String,
    uptime_seconds: u64,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/react-config", get(react_config_handler))
        .route("/api/conversations", post(save_conversation_handler))
        .route("/api/conversations/update", post(save_conversation_handler))
        .route("/api/azure-openai/{target}", post(chat_handler))
        .fallback(not_found_handler)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_requests)).layer(cors))
        .with_state(state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState,
    tls: Option<(String, String)>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(state);

    if let Some((cert_path, key_path)) = tls {
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &cert_path,
            &key_path
        ).await?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        info!("HTTPS server listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service()).await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        info!("HTTP server listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal()).await?;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let resp = next.run(req).await;

    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        resp.status().as_u16(),
        started.elapsed().as_millis()
    );
    resp
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ServiceError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection @ (JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_))) =>
            Err(ServiceError::validation(format!("Invalid JSON body: {}", rejection.body_text()), Value::Null)),
        Err(rejection) =>
            Err(ServiceError::UnreadableBody {
                status: rejection.status(),
                message: rejection.body_text(),
            }),
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        environment: state.config.environment.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn react_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ClientConfig::from_service(&state.config))
}

async fn save_conversation_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>
) -> Response {
    let record = match json_body(payload).and_then(|body| ConversationRecord::from_body(&body)) {
        Ok(record) => record,
        Err(e) => {
            if let ServiceError::Validation { received, .. } = &e {
                warn!("Rejected conversation save: {} (received: {})", e, received);
            }
            return e.into_response();
        }
    };

    let created = record.is_new();
    let conversation_id = record.conversation_id.clone();
    info!(
        "Saving conversation {} (user {}, chat type {}, {} messages)",
        conversation_id,
        record.user_id,
        record.chat_type,
        record.messages.len()
    );

    match state.archive.save(record).await {
        Ok(_) => {
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            info!(
                "Conversation {} {}",
                conversation_id,
                if created { "created" } else { "updated" }
            );
            (status, Json(SaveReceipt { conversation_id })).into_response()
        }
        Err(e) => {
            error!("Error saving conversation {}: {}", conversation_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to update conversation",
                    "details": e.to_string(),
                })),
            ).into_response()
        }
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Path(target): Path<String>,
    payload: Result<Json<Value>, JsonRejection>
) -> Response {
    match target.parse::<AiTarget>() {
        Ok(target) => relay_chat(&state, target, payload).await,
        Err(e) => {
            warn!("{}", e);
            not_found(&format!("/api/azure-openai/{}", target)).into_response()
        }
    }
}

async fn relay_chat(
    state: &AppState,
    target: AiTarget,
    payload: Result<Json<Value>, JsonRejection>
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(e) => {
            return e.into_response();
        }
    };

    info!("{} chat proxy called", target);
    match state.proxy.chat(target.config(&state.config), &body).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn not_found(path: &str) -> (StatusCode, Json<Value>) {
    let error = if path.starts_with("/api/") { "API endpoint not found" } else { "Not found" };
    (StatusCode::NOT_FOUND, Json(json!({ "error": error, "path": path })))
}

async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    not_found(uri.path())
}
