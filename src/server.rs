//! JSON HTTP server for the frontend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Reachability check (returns `"Connected!"`) |
//! | `GET`  | `/documents` | Plain-text library listing |
//! | `GET`  | `/token-usage` | Per-model token counters |
//! | `POST` | `/save` | Persist a study interaction log |
//! | `POST` | `/query` | Dispatch one model task |
//!
//! # Error Contract
//!
//! Caller mistakes (bad task, missing settings, malformed input) are 400s
//! with a JSON error body. Broken invariants are 500s. A non-200 from the
//! model service is NOT an HTTP error here: `/query` answers 200 with
//! `{"success": false, "status": ..., "response": ...}` so the frontend can
//! show the failure inline.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the frontend is a
//! browser app served from elsewhere.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::client::ModelClient;
use crate::config::Config;
use crate::corpus::CorpusStore;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::library::scan_library;
use crate::models::QueryRequest;
use crate::usage::read_usage;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
}

/// Starts the HTTP server.
///
/// Loads both embedding corpora, builds the model client, and binds to the
/// address configured in `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    let corpora = Arc::new(CorpusStore::load(&config.corpus)?);
    let client = ModelClient::from_config(&config.model)?;
    let dispatcher = Arc::new(Dispatcher::new(config.clone(), client, corpora));

    let state = AppState { config, dispatcher };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    info!("listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_connected))
        .route("/documents", get(handle_documents))
        .route("/token-usage", get(handle_token_usage))
        .route("/save", post(handle_save))
        .route("/query", post(handle_query))
        .with_state(state)
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            DispatchError::Config(_) | DispatchError::Input(_) => StatusCode::BAD_REQUEST,
            // Remote is consumed by the dispatcher (it becomes a failure
            // record); if one ever escapes, it is still a gateway problem.
            DispatchError::Http(_) | DispatchError::Remote { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

/// Handler for `GET /`. Confirms the server is reachable.
async fn handle_connected() -> Json<&'static str> {
    Json("Connected!")
}

/// Handler for `GET /documents`. Scans the library root on every request so
/// newly dropped files show up without a restart.
async fn handle_documents(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let files = scan_library(&state.config.library.root)?;
    Ok(Json(serde_json::to_value(files).map_err(DispatchError::from)?))
}

/// Handler for `GET /token-usage`.
async fn handle_token_usage(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let usage = read_usage(&state.config.usage.dir)?;
    Ok(Json(Value::Object(usage)))
}

/// Request body for `POST /save`.
#[derive(Debug, Deserialize)]
struct SaveRequest {
    dataset: String,
    interactions: Value,
}

/// Handler for `POST /save`. Writes the interaction log for one study
/// dataset; each save replaces the previous file for that dataset.
async fn handle_save(
    State(state): State<AppState>,
    Json(body): Json<SaveRequest>,
) -> Result<Json<Value>, AppError> {
    let name = sanitize_dataset(&body.dataset);
    if name.is_empty() {
        return Err(DispatchError::Input("dataset name must not be empty".into()).into());
    }

    let dir = &state.config.usage.study_dir;
    std::fs::create_dir_all(dir).map_err(DispatchError::from)?;
    let path = dir.join(format!("{}.json", name));
    let content = serde_json::to_string_pretty(&body.interactions).map_err(DispatchError::from)?;
    std::fs::write(&path, content).map_err(DispatchError::from)?;

    info!(dataset = %name, path = %path.display(), "interactions saved");
    Ok(Json(serde_json::json!({})))
}

/// Handler for `POST /query`. One task in, one result record out.
async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Value>, AppError> {
    let record = state.dispatcher.dispatch(&request).await?;
    Ok(Json(serde_json::to_value(record).map_err(DispatchError::from)?))
}

/// Dataset names become file names; strip anything path-like.
fn sanitize_dataset(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
