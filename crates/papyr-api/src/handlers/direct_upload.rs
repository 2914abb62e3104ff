//! Direct upload handlers for files small enough to ship in one request.
//!
//! Single uploads accept one `file` field plus optional `folder` and `type`
//! fields. Batch uploads accept up to 20 `files` fields and are all-or-nothing:
//! nothing is kept unless every file validates and stores.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use papyr_core::{AppError, MediaKind, MediaLimits};
use serde::Serialize;
use std::sync::Arc;

pub const MAX_BATCH_FILES: usize = 20;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub success: bool,
    pub files: Vec<BatchUploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadedFile {
    pub url: String,
    pub name: String,
}

struct PendingFile {
    filename: String,
    content_type: String,
    data: Bytes,
}

fn validate_file(file: &PendingFile, limits: &MediaLimits, kind: MediaKind) -> Result<(), AppError> {
    if !limits.allows_content_type(&file.content_type) {
        return Err(AppError::InvalidInput(format!(
            "Content type {} is not allowed for {} uploads",
            file.content_type,
            kind.as_str()
        )));
    }
    if file.data.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "File {} is empty",
            file.filename
        )));
    }
    if file.data.len() > limits.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "{} is {} bytes, maximum for {} is {} MB",
            file.filename,
            file.data.len(),
            kind.as_str(),
            limits.max_file_size / 1024 / 1024
        )));
    }
    Ok(())
}

async fn read_file_field(field: axum::extract::multipart::Field<'_>) -> Result<PendingFile, AppError> {
    let filename = field
        .file_name()
        .map(|name| name.to_string())
        .ok_or_else(|| AppError::InvalidInput("File field is missing a filename".to_string()))?;
    let content_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .ok_or_else(|| AppError::InvalidInput("File field is missing a content type".to_string()))?;
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read file field: {}", e)))?;
    Ok(PendingFile {
        filename,
        content_type,
        data,
    })
}

/// POST /api/admin/upload
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut file: Option<PendingFile> = None;
    let mut folder: Option<String> = None;
    let mut kind = MediaKind::Image;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => file = Some(read_file_field(field).await?),
            Some("folder") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Bad folder field: {}", e)))?;
                if !value.trim().is_empty() {
                    folder = Some(value.trim().to_string());
                }
            }
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Bad type field: {}", e)))?;
                kind = MediaKind::parse(&value);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let limits = MediaLimits::for_kind(kind);
    validate_file(&file, &limits, kind)?;

    let folder = folder.unwrap_or_else(|| state.config.upload_folder.clone());
    let outcome = state
        .store
        .upload_object(&folder, &file.filename, &file.content_type, file.data)
        .await?;

    tracing::info!(
        key = %outcome.key,
        filename = %file.filename,
        media_type = kind.as_str(),
        "File uploaded"
    );

    Ok(Json(UploadResponse {
        success: true,
        url: outcome.url,
        name: file.filename,
        media_type: kind.as_str().to_string(),
    }))
}

/// PUT /api/admin/upload
///
/// Gallery batch upload. Every file is validated against the batch's media
/// kind before the first byte is stored; a storage failure part-way through
/// rolls back the files already written.
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut files: Vec<PendingFile> = Vec::new();
    let mut folder: Option<String> = None;
    let mut kind = MediaKind::Image;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("files") => {
                if files.len() >= MAX_BATCH_FILES {
                    return Err(HttpAppError(AppError::InvalidInput(format!(
                        "Batch upload accepts at most {} files",
                        MAX_BATCH_FILES
                    ))));
                }
                files.push(read_file_field(field).await?);
            }
            Some("folder") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Bad folder field: {}", e)))?;
                if !value.trim().is_empty() {
                    folder = Some(value.trim().to_string());
                }
            }
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Bad type field: {}", e)))?;
                kind = MediaKind::parse(&value);
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "No files provided".to_string(),
        )));
    }

    let limits = MediaLimits::for_kind(kind);
    for file in &files {
        validate_file(file, &limits, kind)?;
    }

    let folder = folder.unwrap_or_else(|| state.config.batch_upload_folder.clone());
    let mut uploaded: Vec<BatchUploadedFile> = Vec::new();
    let mut uploaded_keys: Vec<String> = Vec::new();

    for file in files {
        match state
            .store
            .upload_object(&folder, &file.filename, &file.content_type, file.data)
            .await
        {
            Ok(outcome) => {
                uploaded_keys.push(outcome.key);
                uploaded.push(BatchUploadedFile {
                    url: outcome.url,
                    name: file.filename,
                });
            }
            Err(e) => {
                // All-or-nothing: roll back whatever already landed.
                for key in &uploaded_keys {
                    if let Err(delete_err) = state.store.delete(key).await {
                        tracing::warn!(
                            error = %delete_err,
                            key = %key,
                            "Failed to roll back batch upload"
                        );
                    }
                }
                return Err(e.into());
            }
        }
    }

    tracing::info!(count = uploaded.len(), folder = %folder, "Batch upload completed");

    Ok(Json(BatchUploadResponse {
        success: true,
        files: uploaded,
    }))
}
