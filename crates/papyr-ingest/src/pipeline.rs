//! The ingestion pipeline: download external images, upload them to owned
//! storage, and rewrite the content.

use bytes::Bytes;
use papyr_storage::{ObjectStore, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::scan::{extract_image_urls, filename_from_url, guess_content_type, is_external_url};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Store(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result of one ingestion run. `uploaded_count` counts distinct URLs actually
/// migrated, not textual occurrences rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub content: String,
    pub uploaded_count: usize,
}

/// Copies externally hosted images into owned storage at content-save time.
pub struct ImageIngestor {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
    owned_marker: String,
    folder: String,
}

impl ImageIngestor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        owned_marker: String,
        folder: String,
    ) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;
        Ok(ImageIngestor {
            store,
            http,
            owned_marker,
            folder,
        })
    }

    /// Migrate every external image referenced in `content` and rewrite the
    /// references.
    ///
    /// Each distinct external URL is downloaded and uploaded at most once per
    /// run, however many times it occurs. A URL that fails to migrate keeps
    /// its original form; other URLs are unaffected. All successful rewrites
    /// are applied together, so callers never observe a partially rewritten
    /// string. Running ingest again on fully migrated content uploads nothing.
    pub async fn ingest(&self, content: &str) -> IngestOutcome {
        let referenced = extract_image_urls(content);
        if referenced.is_empty() {
            return IngestOutcome {
                content: content.to_string(),
                uploaded_count: 0,
            };
        }

        let mut seen = HashSet::new();
        let external: Vec<String> = referenced
            .into_iter()
            .filter(|url| is_external_url(url, &self.owned_marker))
            .filter(|url| seen.insert(url.clone()))
            .collect();

        let mut rewrites: HashMap<String, String> = HashMap::new();
        for url in &external {
            match self.migrate(url).await {
                Ok(owned_url) => {
                    tracing::info!(from = %url, to = %owned_url, "Migrated remote image");
                    rewrites.insert(url.clone(), owned_url);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %url,
                        "Failed to migrate remote image, keeping original URL"
                    );
                }
            }
        }

        let uploaded_count = rewrites.len();
        let mut rewritten = content.to_string();
        for (original, owned) in &rewrites {
            rewritten = rewritten.replace(original.as_str(), owned);
        }

        IngestOutcome {
            content: rewritten,
            uploaded_count,
        }
    }

    /// Download one external image and upload it to owned storage, returning
    /// the new owned URL.
    async fn migrate(&self, url: &str) -> Result<String, IngestError> {
        let data = self.download(url).await?;
        let filename = filename_from_url(url);
        let content_type = self.resolve_content_type(url, &filename).await;

        let outcome = self
            .store
            .upload_object(&self.folder, &filename, &content_type, data)
            .await?;
        Ok(outcome.url)
    }

    async fn download(&self, url: &str) -> Result<Bytes, IngestError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::Download(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| IngestError::Download(e.to_string()))
    }

    /// Prefer the content type reported by a HEAD request; fall back to an
    /// extension-based guess when the request fails or reports nothing usable.
    async fn resolve_content_type(&self, url: &str, filename: &str) -> String {
        let reported = match self.http.head(url).send().await {
            Ok(response) => response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(_) => None,
        };
        reported.unwrap_or_else(|| guess_content_type(filename).to_string())
    }
}
