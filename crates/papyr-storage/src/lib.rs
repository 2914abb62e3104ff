//! Papyr Storage Library
//!
//! Storage abstraction for the upload pipeline. The `ObjectStore` trait covers
//! whole-object puts, deletes, signed URLs, and the three multipart primitives
//! (init, upload-part, complete). Backends: S3-compatible stores via the AWS
//! SDK, and an in-memory store for tests and local development.
//!
//! # Key format
//!
//! Object keys are `{folder}/{timestamp_ms}-{random}.{ext}`, generated once per
//! upload in the `keys` module. Timestamp plus a 13-character random suffix
//! makes collisions improbable without a round-trip existence check.

pub mod keys;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use keys::generate_object_key;
pub use memory::MemoryStore;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Config, S3Store};
pub use traits::{
    CompletedObject, MultipartInit, ObjectStore, PutOutcome, StorageError, StorageResult,
    UploadedPart, MAX_SIGNED_URL_EXPIRY_SECS, MIN_SIGNED_URL_EXPIRY_SECS,
};
