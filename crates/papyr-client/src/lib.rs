//! HTTP client for the upload API.
//!
//! Wraps the admin endpoints behind a typed interface and implements the
//! client side of the upload pipeline: small files go up in one multipart
//! request, large files through the init / chunk / complete protocol with
//! bounded part concurrency and byte-accurate progress reporting.

pub mod plan;
pub mod upload;

pub use plan::{
    needs_chunking, PartPlan, PartSpec, DEFAULT_PART_SIZE, DIRECT_UPLOAD_THRESHOLD, MIN_PART_SIZE,
};
pub use upload::{ProgressFn, UploadOptions, UploadOutcome};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Client for the admin upload API, authenticated with a Bearer token.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: String, token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// POST a JSON body and deserialize the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let request = self.authed(self.http.post(self.build_url(path))).json(body);
        let response = request.send().await.context("Failed to send request")?;
        Self::parse_response(response).await
    }

    /// Send a multipart form and deserialize the JSON response.
    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let request = self
            .authed(self.http.request(method, self.build_url(path)))
            .multipart(form);
        let response = request.send().await.context("Failed to send request")?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }
        response
            .json()
            .await
            .context("Failed to parse API response")
    }
}
