//! dayplan server
//!
//! HTTP API for ingestion and plan generation.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dayplan::{
    Assistant, Config, Document, Error, ErrorKind, IngestReceipt, Plan, PlanRequest, PlanRevision,
    Status,
};

type SharedState = Arc<Assistant>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing credentials stop the process here
    let config = Config::from_env()?;
    tracing::info!("Starting dayplan server on port {}", config.server_port);
    tracing::info!("Data directory: {:?}", config.data_dir);

    let assistant = Assistant::from_config(&config).await?;
    let state: SharedState = Arc::new(assistant);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/ingest", post(ingest))
        .route("/data/ingest/text", post(ingest_text))
        .route("/plan", post(generate_plan))
        .route("/plan/generate", post(generate_plan))
        .route("/plan/revise", post(revise_plan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state);

    let port = config.server_port;
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

// === Errors ===

struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Generation => StatusCode::BAD_GATEWAY,
            ErrorKind::Storage | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(%kind, error = %self.0, "Request failed");

        (
            status,
            Json(json!({ "error": self.0.to_string(), "kind": kind.to_string() })),
        )
            .into_response()
    }
}

// === Handlers ===

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "Planning assistant is running",
    })
}

async fn health() -> &'static str {
    "ok"
}

/// Status plus the count under the key the web frontend reads
#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: Status,
    db_document_count: Option<usize>,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> Self {
        Self {
            db_document_count: status.document_count,
            status,
        }
    }
}

async fn status(State(state): State<SharedState>) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(state.query_status().await?.into()))
}

async fn ingest(
    State(state): State<SharedState>,
    Json(document): Json<Document>,
) -> Result<Json<IngestReceipt>, ApiError> {
    Ok(Json(state.ingest(&document).await?))
}

/// Form-style ingestion: `doc_id`, `content` and `source_type` as query parameters
async fn ingest_text(
    State(state): State<SharedState>,
    Query(document): Query<Document>,
) -> Result<Json<IngestReceipt>, ApiError> {
    Ok(Json(state.ingest(&document).await?))
}

async fn generate_plan(
    State(state): State<SharedState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<Plan>, ApiError> {
    Ok(Json(state.generate_plan(&request).await?))
}

#[derive(Serialize)]
struct RevisedPlanResponse {
    plan: String,
}

async fn revise_plan(
    State(state): State<SharedState>,
    Json(revision): Json<PlanRevision>,
) -> Result<Json<RevisedPlanResponse>, ApiError> {
    let plan = state
        .revise_plan(&revision.existing_plan, &revision.new_guidance)
        .await?;
    Ok(Json(RevisedPlanResponse { plan }))
}
