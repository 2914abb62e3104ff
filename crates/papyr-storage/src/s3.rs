//! S3-compatible storage backend using the AWS SDK.
//!
//! Works against AWS S3 and S3-compatible providers (Tencent COS, MinIO,
//! DigitalOcean Spaces) via a custom endpoint. Credentials come from the
//! standard AWS environment/credential chain; everything else is passed in
//! explicitly through `S3Config` at construction time.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::time::Duration;

use crate::traits::{
    clamp_signed_url_expiry, CompletedObject, MultipartInit, ObjectStore, PutOutcome,
    StorageError, StorageResult, UploadedPart,
};

/// Connection settings for an S3-compatible bucket.
#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (e.g. "https://cos.ap-shanghai.myqcloud.com").
    pub endpoint: Option<String>,
    /// Optional custom public domain for object URLs.
    pub custom_domain: Option<String>,
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    /// Build a client from the shared AWS credential chain plus explicit
    /// region/endpoint settings. Constructed once per process and shared.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::ConfigError("S3 bucket is empty".to_string()));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Ok(S3Store { client, config })
    }

    /// Public URL for an object key.
    ///
    /// Custom domain if configured; path-style `{endpoint}/{bucket}/{key}` for
    /// custom endpoints; otherwise the standard virtual-hosted AWS format.
    fn public_url(&self, key: &str) -> String {
        if let Some(ref domain) = self.config.custom_domain {
            let host = domain.trim_end_matches('/');
            format!("https://{}/{}", host.trim_start_matches("https://"), key)
        } else if let Some(ref endpoint) = self.config.endpoint {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.config.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, key
            )
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<PutOutcome> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(PutOutcome {
            key: key.to_string(),
            url: self.public_url(key),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        // S3 DeleteObject on a missing key succeeds, which gives us the
        // idempotency the contract requires.
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn signed_url(&self, key: &str, expiry_secs: u64) -> StorageResult<String> {
        let expiry = clamp_signed_url_expiry(expiry_secs);
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expiry))
            .map_err(|e| StorageError::SignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::SignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn init_multipart(&self, key: &str, content_type: &str) -> StorageResult<MultipartInit> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    "S3 multipart init failed"
                );
                StorageError::InitFailed(e.to_string())
            })?;

        let upload_id = output
            .upload_id()
            .ok_or_else(|| StorageError::InitFailed("store returned no upload id".to_string()))?
            .to_string();

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            upload_id = %upload_id,
            "S3 multipart upload initialized"
        );

        Ok(MultipartInit { upload_id })
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StorageResult<UploadedPart> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let output = self
            .client
            .upload_part()
            .bucket(&self.config.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    part_number = part_number,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 part upload failed"
                );
                StorageError::PartFailed(e.to_string())
            })?;

        let etag = output
            .e_tag()
            .ok_or_else(|| StorageError::PartFailed("store returned no etag".to_string()))?
            .to_string();

        tracing::debug!(
            bucket = %self.config.bucket,
            key = %key,
            part_number = part_number,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 part uploaded"
        );

        Ok(UploadedPart { part_number, etag })
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<UploadedPart>,
    ) -> StorageResult<CompletedObject> {
        if parts.is_empty() {
            return Err(StorageError::InvalidParts("no parts submitted".to_string()));
        }

        // Parts complete in arbitrary order under concurrent upload; the store
        // requires ascending part numbers.
        parts.sort_by_key(|p| p.part_number);

        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    parts = parts.len(),
                    "S3 multipart complete failed"
                );
                StorageError::CompleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            parts = parts.len(),
            "S3 multipart upload completed"
        );

        Ok(CompletedObject {
            key: key.to_string(),
            url: self.public_url(key),
        })
    }
}
