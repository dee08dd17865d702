//! HTTP routes
//!
//! - `GET  /health`: liveness plus store connectivity
//! - `POST /api/v1/catalog/sync`: run one ingestion, answering `{ok, n}`
//! - `GET  /api/v1/catalog/:id`: read one stored record

use crate::error::AppError;
use crate::ingest::{CatalogPipeline, MaskedMetadata, PipelineStats};
use crate::middleware;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CatalogPipeline>,
}

impl AppState {
    pub fn new(pipeline: CatalogPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Optional body of a sync request
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Overrides the configured feed for this run only
    pub feed_url: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    let catalog = Router::new()
        .route("/sync", post(sync_catalog))
        .route("/:id", get(get_record));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/catalog", catalog)
        .with_state(state)
        .layer(middleware::tracing_layer())
}

async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.pipeline.store().ping().await.map_err(|e| {
        tracing::error!("Store health check failed: {}", e);
        AppError::Unavailable("store unreachable".to_string())
    })?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "database": "connected"
        })),
    ))
}

impl SyncRequest {
    /// An empty body means "use the configured feed"; anything else must be
    /// a valid request object
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid sync request body: {}", e)))
    }
}

/// Run the pipeline to completion within the request
async fn sync_catalog(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PipelineStats>, AppError> {
    let request = SyncRequest::from_body(&body)?;
    let feed_url = request
        .feed_url
        .unwrap_or_else(|| state.pipeline.config().feed_url.clone());

    if !(feed_url.starts_with("http://") || feed_url.starts_with("https://")) {
        return Err(AppError::BadRequest(format!("feed_url must be http(s): {}", feed_url)));
    }

    info!("Catalog sync requested for {}", feed_url);
    let stats = state.pipeline.run(&feed_url).await?;

    Ok(Json(stats))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaskedMetadata>, AppError> {
    state
        .pipeline
        .store()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Catalog record {}", id)))
}
