pub mod direct_upload;
pub mod ingest;
pub mod multipart_upload;
