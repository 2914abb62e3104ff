//! Configuration module
//!
//! Configuration is read from environment variables once at process start and
//! passed explicitly to the services that need it. The object-store client is
//! constructed from this struct; there is no module-level client singleton.

use std::env;

use crate::error::AppError;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_UPLOAD_FOLDER: &str = "article";
const DEFAULT_BATCH_FOLDER: &str = "gallery";

/// Process-wide configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Bearer token accepted by the admin endpoints. Session issuance lives
    /// outside this service; we only verify.
    pub admin_token: String,
    pub cors_origins: Vec<String>,
    // Object store
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, COS, DO Spaces).
    pub s3_endpoint: Option<String>,
    /// Optional custom public domain for object URLs.
    pub s3_custom_domain: Option<String>,
    /// Default folder for single uploads and multipart sessions.
    pub upload_folder: String,
    /// Default folder for batch (gallery) uploads.
    pub batch_upload_folder: String,
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(name: &str) -> Result<String, AppError> {
    env_opt(name).ok_or_else(|| AppError::Internal(format!("{} is not configured", name)))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let server_port = env_opt("SERVER_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT);

        let cors_origins = env_opt("CORS_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        Ok(Config {
            server_port,
            environment: env_opt("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            admin_token: env_required("ADMIN_TOKEN")?,
            cors_origins,
            s3_bucket: env_required("S3_BUCKET")?,
            s3_region: env_required("S3_REGION")?,
            s3_endpoint: env_opt("S3_ENDPOINT"),
            s3_custom_domain: env_opt("S3_CUSTOM_DOMAIN"),
            upload_folder: env_opt("UPLOAD_FOLDER")
                .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
            batch_upload_folder: env_opt("BATCH_UPLOAD_FOLDER")
                .unwrap_or_else(|| DEFAULT_BATCH_FOLDER.to_string()),
        })
    }

    /// Substring that identifies URLs already served from our own bucket.
    /// The ingestion pipeline treats any URL containing it as owned.
    pub fn owned_url_marker(&self) -> String {
        self.s3_custom_domain
            .clone()
            .unwrap_or_else(|| self.s3_bucket.clone())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
