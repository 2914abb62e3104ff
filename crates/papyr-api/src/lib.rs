//! HTTP API for the upload pipeline.
//!
//! Admin endpoints under `/api/admin`, all behind bearer-token auth:
//! direct single and batch uploads, the three-phase chunked upload protocol
//! (init / chunk / complete), and remote image ingestion at content-save time.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::router;
pub use state::AppState;
