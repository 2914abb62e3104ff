//! Chunked upload handlers for large files.
//!
//! Three-phase protocol: init reserves an object key and opens a multipart
//! session, chunk uploads one part and echoes back its etag, complete submits
//! the full part list and finalizes the object. The server holds no session
//! state between phases; the client carries `uploadId` and `key` through every
//! call, so any instance can serve any phase.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use papyr_core::{AppError, MediaKind, MediaLimits};
use papyr_storage::{generate_object_key, UploadedPart};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Chunk counts above this are rejected at init; clients must use a larger
/// chunk size instead. Matches the S3 part-count ceiling.
pub const MAX_CHUNK_COUNT: u32 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitChunkedUploadRequest {
    pub filename: String,
    pub file_size: u64,
    pub total_chunks: u32,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitChunkedUploadResponse {
    pub success: bool,
    #[serde(rename = "uploadId")]
    pub upload_id: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct UploadChunkResponse {
    pub success: bool,
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteChunkedUploadRequest {
    #[serde(rename = "uploadId")]
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<PartInput>,
}

#[derive(Debug, Deserialize)]
pub struct PartInput {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteChunkedUploadResponse {
    pub success: bool,
    pub url: String,
    pub name: String,
}

/// POST /api/admin/upload/init
pub async fn init_chunked_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InitChunkedUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.filename.trim().is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "filename must not be empty".to_string(),
        )));
    }
    if request.file_size == 0 {
        return Err(HttpAppError(AppError::InvalidInput(
            "fileSize must be greater than 0".to_string(),
        )));
    }
    if request.total_chunks == 0 || request.total_chunks > MAX_CHUNK_COUNT {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "totalChunks must be between 1 and {}",
            MAX_CHUNK_COUNT
        ))));
    }

    let kind = MediaKind::parse(request.media_type.as_deref().unwrap_or("image"));
    let limits = MediaLimits::for_kind(kind);
    if request.file_size > limits.max_file_size as u64 {
        return Err(HttpAppError(AppError::PayloadTooLarge(format!(
            "File size {} exceeds maximum for {} ({} MB)",
            request.file_size,
            kind.as_str(),
            limits.max_file_size / 1024 / 1024
        ))));
    }

    let folder = request
        .folder
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(&state.config.upload_folder);
    let key = generate_object_key(folder, &request.filename);

    let init = state
        .store
        .init_multipart(&key, kind.default_content_type())
        .await?;

    tracing::info!(
        key = %key,
        upload_id = %init.upload_id,
        file_size = request.file_size,
        total_chunks = request.total_chunks,
        "Chunked upload session started"
    );

    Ok(Json(InitChunkedUploadResponse {
        success: true,
        upload_id: init.upload_id,
        key,
    }))
}

/// POST /api/admin/upload/chunk
///
/// Multipart form: `chunk` (bytes), `uploadId`, `key`, `partNumber` (1-based).
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut chunk: Option<bytes::Bytes> = None;
    let mut upload_id: Option<String> = None;
    let mut key: Option<String> = None;
    let mut part_number: Option<i32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("chunk") => {
                chunk = Some(field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read chunk field: {}", e))
                })?);
            }
            Some("uploadId") => {
                upload_id = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Bad uploadId field: {}", e))
                })?);
            }
            Some("key") => {
                key = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Bad key field: {}", e))
                })?);
            }
            Some("partNumber") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Bad partNumber field: {}", e))
                })?;
                part_number = Some(text.trim().parse().map_err(|_| {
                    AppError::InvalidInput(format!("partNumber must be an integer, got {:?}", text))
                })?);
            }
            _ => {}
        }
    }

    let chunk = chunk.ok_or_else(|| AppError::InvalidInput("No chunk provided".to_string()))?;
    let upload_id =
        upload_id.ok_or_else(|| AppError::InvalidInput("uploadId is required".to_string()))?;
    let key = key.ok_or_else(|| AppError::InvalidInput("key is required".to_string()))?;
    let part_number =
        part_number.ok_or_else(|| AppError::InvalidInput("partNumber is required".to_string()))?;

    if part_number < 1 || part_number as u32 > MAX_CHUNK_COUNT {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "partNumber must be between 1 and {}",
            MAX_CHUNK_COUNT
        ))));
    }
    if chunk.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "Chunk is empty".to_string(),
        )));
    }

    let part = state
        .store
        .upload_part(&key, &upload_id, part_number, chunk)
        .await?;

    tracing::debug!(
        key = %key,
        upload_id = %upload_id,
        part_number = part.part_number,
        "Chunk uploaded"
    );

    Ok(Json(UploadChunkResponse {
        success: true,
        part_number: part.part_number,
        etag: part.etag,
    }))
}

/// POST /api/admin/upload/complete
pub async fn complete_chunked_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteChunkedUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.parts.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "parts must not be empty".to_string(),
        )));
    }
    let mut seen = HashSet::new();
    for part in &request.parts {
        if part.part_number < 1 || part.part_number as u32 > MAX_CHUNK_COUNT {
            return Err(HttpAppError(AppError::InvalidInput(format!(
                "partNumber must be between 1 and {}",
                MAX_CHUNK_COUNT
            ))));
        }
        if !seen.insert(part.part_number) {
            return Err(HttpAppError(AppError::InvalidInput(format!(
                "Duplicate part number {}",
                part.part_number
            ))));
        }
    }

    let parts: Vec<UploadedPart> = request
        .parts
        .into_iter()
        .map(|p| UploadedPart {
            part_number: p.part_number,
            etag: p.etag,
        })
        .collect();

    let completed = state
        .store
        .complete_multipart(&request.key, &request.upload_id, parts)
        .await?;

    let name = completed
        .key
        .rsplit('/')
        .next()
        .unwrap_or(completed.key.as_str())
        .to_string();

    tracing::info!(
        key = %completed.key,
        upload_id = %request.upload_id,
        "Chunked upload completed"
    );

    Ok(Json(CompleteChunkedUploadResponse {
        success: true,
        url: completed.url,
        name,
    }))
}
