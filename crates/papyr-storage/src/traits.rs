//! Storage abstraction trait
//!
//! This module defines the ObjectStore trait that all storage backends must
//! implement, together with the error and result types shared by backends.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::keys::generate_object_key;

/// Lower bound for signed-URL expiry (60 seconds).
pub const MIN_SIGNED_URL_EXPIRY_SECS: u64 = 60;
/// Upper bound for signed-URL expiry (7 days).
pub const MAX_SIGNED_URL_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signed URL generation failed: {0}")]
    SignFailed(String),

    #[error("Multipart init failed: {0}")]
    InitFailed(String),

    #[error("Part upload failed: {0}")]
    PartFailed(String),

    #[error("Multipart complete failed: {0}")]
    CompleteFailed(String),

    #[error("Invalid part list: {0}")]
    InvalidParts(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a whole-object upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub key: String,
    pub url: String,
}

/// Handle for an open multipart session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartInit {
    pub upload_id: String,
}

/// Acknowledgement for one uploaded part. Part numbers are 1-based and match
/// byte-range order; the etag is the store's opaque integrity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub etag: String,
}

/// Result of completing a multipart session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedObject {
    pub key: String,
    pub url: String,
}

/// Clamp a requested signed-URL expiry to [60 s, 7 days].
pub fn clamp_signed_url_expiry(expiry_secs: u64) -> u64 {
    expiry_secs.clamp(MIN_SIGNED_URL_EXPIRY_SECS, MAX_SIGNED_URL_EXPIRY_SECS)
}

/// Storage abstraction trait
///
/// All storage backends must implement this trait so the upload endpoints and
/// the ingestion pipeline stay independent of the storage vendor.
///
/// Every successful call durably creates or modifies state in the store; there
/// is no local cache and no read-after-write guarantee beyond the store's own.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a whole object in one call. Callers must not assume partial
    /// writes are visible on failure.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<PutOutcome>;

    /// Delete an object. Idempotent: deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Generate a time-limited read URL for an otherwise-private object.
    /// The expiry is clamped to [60 s, 7 days] regardless of the request.
    async fn signed_url(&self, key: &str, expiry_secs: u64) -> StorageResult<String>;

    /// Begin a multipart session for the given key.
    async fn init_multipart(&self, key: &str, content_type: &str) -> StorageResult<MultipartInit>;

    /// Upload exactly one part. Retry-safe: re-sending a part number after a
    /// transient failure overwrites rather than duplicates.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StorageResult<UploadedPart>;

    /// Finalize the object from all parts. Implementations sort the parts by
    /// part number before submitting, since concurrent upload order is not
    /// guaranteed to match logical order.
    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> StorageResult<CompletedObject>;

    /// Upload with a freshly generated `{folder}/{timestamp}-{random}.{ext}`
    /// key. Convenience over `put` for the direct-upload and ingestion paths.
    async fn upload_object(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<PutOutcome> {
        let key = generate_object_key(folder, filename);
        self.put(&key, data, content_type).await
    }
}
