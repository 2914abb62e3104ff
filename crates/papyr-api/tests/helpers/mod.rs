//! Shared fixtures for the API integration tests: an app wired to the
//! in-memory store, plus raw multipart body construction.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use papyr_api::{router, AppState};
use papyr_core::Config;
use papyr_storage::MemoryStore;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-admin-token";
pub const BOUNDARY: &str = "papyr-test-boundary";

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        admin_token: TEST_TOKEN.to_string(),
        cors_origins: vec![],
        s3_bucket: "blog-media".to_string(),
        s3_region: "ap-shanghai".to_string(),
        s3_endpoint: None,
        // The memory store serves URLs under this domain, so the ingestion
        // pipeline treats them as owned.
        s3_custom_domain: Some("memory.test".to_string()),
        upload_folder: "article".to_string(),
        batch_upload_folder: "gallery".to_string(),
    }
}

pub fn test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(test_config(), Arc::new(store.clone())).expect("build state");
    (router(Arc::new(state)), store)
}

pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn authed(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {}", TEST_TOKEN))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("infallible router");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

pub async fn post_json(
    app: &Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = authed(Request::post(path))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

pub async fn post_multipart(
    app: &Router,
    path: &str,
    parts: &[Part<'_>],
) -> (StatusCode, serde_json::Value) {
    let request = authed(Request::post(path))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build request");
    send(app, request).await
}

pub async fn put_multipart(
    app: &Router,
    path: &str,
    parts: &[Part<'_>],
) -> (StatusCode, serde_json::Value) {
    let request = authed(Request::put(path))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build request");
    send(app, request).await
}
