//! Core types shared across the papyr upload pipeline.
//!
//! This crate holds configuration, the unified error type, and the media-type
//! policy (size limits and content-type allow-lists). It has no I/O of its own.

pub mod config;
pub mod error;
pub mod media;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use media::{MediaKind, MediaLimits};
