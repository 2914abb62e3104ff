//! Admin bearer-token authentication.
//!
//! Every admin endpoint sits behind this middleware. Session issuance lives
//! outside this service; we only verify the configured token. Comparison is
//! constant-time so response timing leaks nothing about the token.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use papyr_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

fn token_matches(presented: &str, expected: &str) -> bool {
    // ct_eq on slices already returns false for length mismatches without
    // short-circuiting within equal-length comparisons.
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, HttpAppError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token_matches(token, &state.config.admin_token) => {
            Ok(next.run(request).await)
        }
        _ => Err(HttpAppError(AppError::Unauthorized(
            "admin token required".to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_accepts_exact_token_only() {
        assert!(token_matches("secret-token", "secret-token"));
        assert!(!token_matches("secret-token2", "secret-token"));
        assert!(!token_matches("secret-toke", "secret-token"));
        assert!(!token_matches("", "secret-token"));
    }
}
