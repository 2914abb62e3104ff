//! Content-save hook that migrates externally hosted images.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub content: String,
    #[serde(rename = "uploadedCount")]
    pub uploaded_count: usize,
}

/// POST /api/admin/ingest
///
/// Always succeeds: URLs that cannot be migrated stay as they are, so saving
/// content is never blocked by a flaky external host.
pub async fn ingest_content(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state.ingestor.ingest(&request.content).await;

    Ok(Json(IngestResponse {
        content: outcome.content,
        uploaded_count: outcome.uploaded_count,
    }))
}
