//! Remote image ingestion.
//!
//! Rich-text content saved to the CMS may reference externally hosted images.
//! This crate scans content for image URLs (markdown and `<img>` syntax),
//! downloads each distinct external image once, re-uploads it to owned
//! storage, and rewrites the content to point at the new owned URL. Failures
//! are contained per URL: an image that cannot be migrated keeps its original
//! URL and never fails the surrounding save.

pub mod pipeline;
pub mod scan;

pub use pipeline::{ImageIngestor, IngestError, IngestOutcome};
pub use scan::{extract_image_urls, filename_from_url, guess_content_type, is_external_url};
