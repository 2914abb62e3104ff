//! The client-side upload orchestrator.
//!
//! `upload_file` picks the path from the file size: below the chunking
//! threshold it sends one multipart request with byte-accurate progress from
//! the request body stream; at or above it, it runs the init / chunk /
//! complete protocol with a bounded number of parts in flight. It never
//! returns `Err` - failures come back inside `UploadOutcome` so UI callers
//! have one shape to render.

use crate::plan::{needs_chunking, PartPlan, DEFAULT_PART_SIZE};
use crate::ApiClient;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Clone, Default)]
pub struct UploadOptions {
    /// Part size for the chunked path; raised to the minimum when too small.
    /// Zero means the default.
    pub part_size: usize,
    /// Parts in flight at once on the chunked path. Zero means the default.
    pub concurrency: usize,
    pub folder: Option<String>,
    /// "image" or "video"; the server defaults to image.
    pub media_type: Option<String>,
    /// Called with 0-100 as bytes (direct) or parts (chunked) go up.
    pub on_progress: Option<ProgressFn>,
}

/// What the caller gets back, success or not.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub success: bool,
    pub url: Option<String>,
    pub name: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitRequest<'a> {
    filename: &'a str,
    file_size: usize,
    total_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
}

#[derive(Deserialize)]
struct InitResponse {
    #[serde(rename = "uploadId")]
    upload_id: String,
    key: String,
}

#[derive(Deserialize)]
struct ChunkResponse {
    #[serde(rename = "PartNumber")]
    part_number: i32,
    #[serde(rename = "ETag")]
    etag: String,
}

#[derive(Serialize)]
struct CompletedPartField {
    #[serde(rename = "PartNumber")]
    part_number: i32,
    #[serde(rename = "ETag")]
    etag: String,
}

#[derive(Serialize)]
struct CompleteRequest<'a> {
    #[serde(rename = "uploadId")]
    upload_id: &'a str,
    key: &'a str,
    parts: Vec<CompletedPartField>,
}

/// Response shape shared by direct upload and chunked completion.
#[derive(Deserialize)]
struct FinishedResponse {
    url: String,
    name: String,
}

impl ApiClient {
    /// Upload one file, choosing direct or chunked transport by size.
    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
        options: UploadOptions,
    ) -> UploadOutcome {
        let result = if needs_chunking(data.len()) {
            self.chunked_upload(filename, data, &options).await
        } else {
            self.direct_upload(filename, content_type, data, &options)
                .await
        };

        match result {
            Ok((url, name)) => UploadOutcome {
                success: true,
                url: Some(url),
                name: Some(name),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, filename = %filename, "Upload failed");
                UploadOutcome {
                    success: false,
                    url: None,
                    name: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn direct_upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<(String, String)> {
        const STREAM_CHUNK: usize = 64 * 1024;

        let total = data.len();
        let sent = Arc::new(AtomicUsize::new(0));
        let progress = options.on_progress.clone();

        // Slice the payload so progress ticks as the body streams out, not
        // just once at the end.
        let mut pieces = Vec::with_capacity(total.div_ceil(STREAM_CHUNK).max(1));
        let mut offset = 0;
        while offset < total {
            let end = (offset + STREAM_CHUNK).min(total);
            pieces.push(data.slice(offset..end));
            offset = end;
        }

        let stream = futures::stream::iter(pieces).map(move |piece: Bytes| {
            let sent_now = sent.fetch_add(piece.len(), Ordering::Relaxed) + piece.len();
            if let Some(cb) = &progress {
                cb(((sent_now * 100 / total.max(1)).min(100)) as u8);
            }
            Ok::<Bytes, std::io::Error>(piece)
        });

        let file_part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total as u64)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .context("Invalid content type")?;

        let mut form = Form::new().part("file", file_part);
        if let Some(folder) = &options.folder {
            form = form.text("folder", folder.clone());
        }
        if let Some(kind) = &options.media_type {
            form = form.text("type", kind.clone());
        }

        let response: FinishedResponse = self
            .send_multipart(reqwest::Method::POST, "/api/admin/upload", form)
            .await?;
        Ok((response.url, response.name))
    }

    async fn chunked_upload(
        &self,
        filename: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<(String, String)> {
        let part_size = if options.part_size == 0 {
            DEFAULT_PART_SIZE
        } else {
            options.part_size
        };
        let plan = PartPlan::new(data.len(), part_size);
        let total_parts = plan.part_count();

        let init: InitResponse = self
            .post_json(
                "/api/admin/upload/init",
                &InitRequest {
                    filename,
                    file_size: data.len(),
                    total_chunks: total_parts,
                    folder: options.folder.as_deref(),
                    media_type: options.media_type.as_deref(),
                },
            )
            .await
            .context("Failed to start chunked upload")?;

        tracing::debug!(
            key = %init.key,
            upload_id = %init.upload_id,
            parts = total_parts,
            "Chunked upload started"
        );

        let concurrency = if options.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            options.concurrency
        };
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let aborted = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for spec in plan {
            let client = self.clone();
            let semaphore = semaphore.clone();
            let aborted = aborted.clone();
            let upload_id = init.upload_id.clone();
            let key = init.key.clone();
            let chunk = data.slice(spec.byte_start..spec.byte_end);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .context("Semaphore closed")?;
                if aborted.load(Ordering::Relaxed) {
                    anyhow::bail!("upload aborted after an earlier part failed");
                }

                let part = client
                    .upload_chunk(&upload_id, &key, spec.part_number, chunk)
                    .await
                    .inspect_err(|_| aborted.store(true, Ordering::Relaxed))?;
                Ok::<ChunkResponse, anyhow::Error>(part)
            });
        }

        // Progress is reported from this single loop, not from the tasks:
        // concurrent tasks could otherwise publish their percentages out of
        // order and break monotonicity.
        let mut parts: Vec<CompletedPartField> = Vec::with_capacity(total_parts);
        let mut first_error: Option<anyhow::Error> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(part)) => {
                    parts.push(CompletedPartField {
                        part_number: part.part_number,
                        etag: part.etag,
                    });
                    if let Some(cb) = &options.on_progress {
                        cb((parts.len() * 100 / total_parts) as u8);
                    }
                }
                Ok(Err(e)) => {
                    aborted.store(true, Ordering::Relaxed);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    aborted.store(true, Ordering::Relaxed);
                    first_error.get_or_insert(e.into());
                }
            }
        }

        // A session with any failed part is never completed; the partial
        // object must not become visible.
        if let Some(e) = first_error {
            return Err(e);
        }

        parts.sort_by_key(|p| p.part_number);
        let done: FinishedResponse = self
            .post_json(
                "/api/admin/upload/complete",
                &CompleteRequest {
                    upload_id: &init.upload_id,
                    key: &init.key,
                    parts,
                },
            )
            .await
            .context("Failed to complete chunked upload")?;

        Ok((done.url, done.name))
    }

    async fn upload_chunk(
        &self,
        upload_id: &str,
        key: &str,
        part_number: i32,
        chunk: Bytes,
    ) -> Result<ChunkResponse> {
        let chunk_part = Part::stream(reqwest::Body::from(chunk))
            .file_name("blob")
            .mime_str("application/octet-stream")
            .context("Invalid chunk content type")?;

        let form = Form::new()
            .part("chunk", chunk_part)
            .text("uploadId", upload_id.to_string())
            .text("key", key.to_string())
            .text("partNumber", part_number.to_string());

        self.send_multipart(reqwest::Method::POST, "/api/admin/upload/chunk", form)
            .await
    }
}
