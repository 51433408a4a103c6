//! HTTP serving surface.
//!
//! Exposes the orchestrator over a JSON API suitable for a bot or gateway
//! front end. All responses use a `{status, data|message}` envelope.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check (returns version) |
//! | `GET`  | `/status` | Build state, probe readiness, sanitized config echo |
//! | `POST` | `/query` | Answer a question: `{text, mode}` |
//! | `POST` | `/documents` | Upload a document: `{file_name, content}` |
//!
//! A build is spawned on startup as a background task; the serving loop
//! keeps accepting requests while it runs. The two tasks coordinate only
//! through the artifact store probe, so queries arriving before readiness
//! fail with a structured not-ready error instead of crashing the loop.
//!
//! 5xx responses carry the generic apology text rather than internal error
//! detail; the detail goes to the log.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::chat::ChatClient;
use crate::config::Config;
use crate::coordinator;
use crate::corpus::flatten_name;
use crate::delivery;
use crate::engine::IndexEngine;
use crate::error::OrchestratorError;
use crate::ingest::ingest_document;
use crate::models::BuildState;
use crate::probe;
use crate::project::Project;
use crate::query::{run_query, SearchMode};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    project: Arc<Project>,
    engine: Arc<dyn IndexEngine>,
    chat: Option<Arc<ChatClient>>,
    /// Diagnostic only; readiness decisions go through the probe.
    build_state: Arc<RwLock<BuildState>>,
}

/// Start the serving loop and the startup build task.
pub async fn run_server(
    config: Config,
    project: Project,
    engine: Arc<dyn IndexEngine>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let chat = if config.chat.is_enabled() {
        match ChatClient::new(&config.chat) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "chat client unavailable, long answers will not be condensed");
                None
            }
        }
    } else {
        None
    };

    let initial_state = if probe::is_index_ready(&project.output_dir()) {
        BuildState::Ready
    } else {
        BuildState::Uninitialized
    };

    let state = AppState {
        config: Arc::new(config),
        project: Arc::new(project),
        engine,
        chat,
        build_state: Arc::new(RwLock::new(initial_state)),
    };

    spawn_startup_build(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/query", post(handle_query))
        .route("/documents", post(handle_ingest))
        .layer(cors)
        .with_state(state);

    info!(addr = %bind_addr, "serving");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the startup build concurrently with the serving loop.
///
/// On failure the build state reverts and the probe keeps reporting
/// not-ready; a forced-rebuild failure is logged as an error, never
/// silently marked ready.
fn spawn_startup_build(state: AppState) {
    tokio::spawn(async move {
        let prior = *state.build_state.read().await;
        *state.build_state.write().await = BuildState::Building;

        let force = state.config.build.force;
        match coordinator::build(&state.config, &state.project, state.engine.as_ref(), force).await
        {
            Ok(outcome) => {
                info!(?outcome, "startup build finished");
                *state.build_state.write().await = BuildState::Ready;
            }
            Err(e) => {
                error!(error = %e, "startup build failed");
                *state.build_state.write().await = prior;
            }
        }
    });
}

// ============ Envelope ============

#[derive(Serialize)]
struct OkEnvelope<T: Serialize> {
    status: &'static str,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<OkEnvelope<T>> {
    Json(OkEnvelope { status: "ok", data })
}

#[derive(Serialize)]
struct ErrorEnvelope {
    status: &'static str,
    message: String,
}

/// Error half of the envelope, carrying its HTTP status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

/// Map a core error to the envelope, hiding internals on server-side
/// failures.
fn classify(err: OrchestratorError) -> ApiError {
    match &err {
        OrchestratorError::InvalidMode(_) => bad_request(err.to_string()),
        OrchestratorError::Ingestion(_) => bad_request(err.to_string()),
        OrchestratorError::NotReady => ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "the index is still being prepared; try again shortly".to_string(),
        },
        OrchestratorError::ArtifactMissing(_) => {
            error!(error = %err, "artifact set incomplete at query time");
            ApiError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: delivery::apology().to_string(),
            }
        }
        OrchestratorError::UpstreamCall(_) => {
            error!(error = %err, "upstream call failed");
            ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: delivery::apology().to_string(),
            }
        }
        OrchestratorError::Build(_) => {
            error!(error = %err, "processing failed");
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: delivery::apology().to_string(),
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthData {
    version: String,
}

async fn handle_health() -> Json<OkEnvelope<HealthData>> {
    ok(HealthData {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /status ============

#[derive(Serialize)]
struct StatusData {
    build_state: BuildState,
    index_ready: bool,
    missing_artifacts: Vec<&'static str>,
    corpus_url: String,
    chat_model: Option<String>,
    chat_api_key: Option<String>,
    embedding_api_key: Option<String>,
}

/// Diagnostic echo of the running configuration. Credentials are masked,
/// never returned in full.
async fn handle_status(State(state): State<AppState>) -> Json<OkEnvelope<StatusData>> {
    let masking = &state.config.delivery;
    let mask = |key: &Option<String>| {
        key.as_deref()
            .map(|k| delivery::mask_secret(k, masking.mask_prefix, masking.mask_suffix))
    };

    let output_dir = state.project.output_dir();
    let missing = probe::missing_artifacts(&output_dir);

    ok(StatusData {
        build_state: *state.build_state.read().await,
        index_ready: missing.is_empty(),
        missing_artifacts: missing.iter().map(|kind| kind.table_name()).collect(),
        corpus_url: state.config.corpus.url.clone(),
        chat_model: state.config.chat.model.clone(),
        chat_api_key: mask(&state.config.chat.api_key),
        embedding_api_key: mask(&state.config.engine.embedding.api_key),
    })
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    text: String,
    #[serde(default = "default_mode")]
    mode: String,
}

fn default_mode() -> String {
    "global".to_string()
}

#[derive(Serialize)]
struct QueryData {
    answer: String,
    /// Transport-sized pieces of the answer, in delivery order.
    chunks: Vec<String>,
    context: serde_json::Value,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<OkEnvelope<QueryData>>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    let mode: SearchMode = request.mode.parse().map_err(classify)?;

    let response = run_query(
        &state.config,
        &state.project,
        state.engine.as_ref(),
        &request.text,
        mode,
    )
    .await
    .map_err(classify)?;

    // Condense long answers when a chat client is configured; a failed
    // completion degrades to the unsummarized answer.
    let mut answer = response.answer;
    if let Some(chat) = &state.chat {
        match delivery::summarize_if_long(chat, &answer, state.config.delivery.summary_budget)
            .await
        {
            Ok(Some(summary)) => answer = summary,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "summarization unavailable, returning full answer"),
        }
    }

    let chunks = delivery::chunk_for_transport(&answer, state.config.delivery.chunk_size);

    Ok(ok(QueryData {
        answer,
        chunks,
        context: response.context,
    }))
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct IngestRequest {
    file_name: String,
    content: String,
}

#[derive(Serialize)]
struct IngestData {
    file_name: String,
}

/// Accepts the upload and schedules the incremental update in the
/// background so in-flight queries are never blocked on re-indexing.
async fn handle_ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<OkEnvelope<IngestData>>), ApiError> {
    if request.file_name.trim().is_empty() {
        return Err(bad_request("file_name must not be empty"));
    }
    if request.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    let unit_name = flatten_name(std::path::Path::new(&request.file_name));

    tokio::spawn(async move {
        match ingest_document(
            &state.project,
            state.engine.as_ref(),
            &request.file_name,
            &request.content,
        )
        .await
        {
            Ok(stages) => info!(stages = stages.len(), "incremental update finished"),
            Err(e) => error!(error = %e, "incremental update failed"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        ok(IngestData {
            file_name: unit_name,
        }),
    ))
}
