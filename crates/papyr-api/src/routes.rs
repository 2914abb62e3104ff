//! Route table and middleware stack.

use crate::auth::require_admin;
use crate::handlers::direct_upload::{upload_batch, upload_file};
use crate::handlers::ingest::ingest_content;
use crate::handlers::multipart_upload::{
    complete_chunked_upload, init_chunked_upload, upload_chunk,
};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest request body we accept: a full-size video upload plus multipart
/// framing overhead.
const MAX_BODY_BYTES: usize = 110 * 1024 * 1024;

async fn health() -> &'static str {
    "OK"
}

pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/upload", post(upload_file).put(upload_batch))
        .route("/upload/init", post(init_chunked_upload))
        .route("/upload/chunk", post(upload_chunk))
        .route("/upload/complete", post(complete_chunked_upload))
        .route("/ingest", post(ingest_content))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api/admin", admin)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    if !state.config.cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.with_state(state)
}
