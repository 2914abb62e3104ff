//! In-memory storage backend.
//!
//! Implements the full `ObjectStore` contract, including multipart session
//! bookkeeping with etag verification, against process memory. Used by the
//! integration tests and local development; it also supports injecting
//! failures so callers can exercise their error paths without a real store.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::traits::{
    clamp_signed_url_expiry, CompletedObject, MultipartInit, ObjectStore, PutOutcome,
    StorageError, StorageResult, UploadedPart,
};

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    data: Bytes,
}

#[derive(Debug, Default)]
struct MultipartSession {
    key: String,
    content_type: String,
    // part number -> (etag, bytes); re-upload of a part number overwrites
    parts: BTreeMap<i32, (String, Bytes)>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, StoredObject>,
    sessions: HashMap<String, MultipartSession>,
    fail_parts: HashSet<i32>,
    fail_puts: bool,
    // Some(n): the next n puts succeed, every later one fails
    puts_before_failure: Option<u64>,
    completed_multiparts: u64,
}

/// HashMap-backed store with full multipart semantics.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    base_url: String,
    next_upload_id: Arc<AtomicU64>,
}

fn etag_for(part_number: i32, data: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    part_number.hash(&mut hasher);
    data.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_base_url("https://memory.test")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        MemoryStore {
            inner: Arc::new(Mutex::new(Inner::default())),
            base_url: base_url.trim_end_matches('/').to_string(),
            next_upload_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ----- test/inspection helpers -----

    /// Make every subsequent upload of the given part number fail.
    pub fn fail_part_number(&self, part_number: i32) {
        self.lock().fail_parts.insert(part_number);
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.lock().fail_puts = fail;
    }

    /// Let the next `n` puts succeed, then fail every later one.
    pub fn fail_puts_after(&self, n: u64) {
        self.lock().puts_before_failure = Some(n);
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.lock().objects.get(key).map(|o| o.data.clone())
    }

    pub fn object_content_type(&self, key: &str) -> Option<String> {
        self.lock().objects.get(key).map(|o| o.content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Multipart sessions initialized and not yet completed.
    pub fn open_multipart_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Multipart sessions completed since construction.
    pub fn completed_multipart_count(&self) -> u64 {
        self.lock().completed_multiparts
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<PutOutcome> {
        let mut inner = self.lock();
        if inner.fail_puts {
            return Err(StorageError::UploadFailed("injected put failure".to_string()));
        }
        if let Some(remaining) = inner.puts_before_failure {
            if remaining == 0 {
                return Err(StorageError::UploadFailed("injected put failure".to_string()));
            }
            inner.puts_before_failure = Some(remaining - 1);
        }
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(PutOutcome {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.lock().objects.remove(key);
        Ok(())
    }

    async fn signed_url(&self, key: &str, expiry_secs: u64) -> StorageResult<String> {
        let expiry = clamp_signed_url_expiry(expiry_secs);
        Ok(format!("{}?expires={}", self.url_for(key), expiry))
    }

    async fn init_multipart(&self, key: &str, content_type: &str) -> StorageResult<MultipartInit> {
        let upload_id = format!("mem-upload-{}", self.next_upload_id.fetch_add(1, Ordering::Relaxed));
        self.lock().sessions.insert(
            upload_id.clone(),
            MultipartSession {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(MultipartInit { upload_id })
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StorageResult<UploadedPart> {
        let mut inner = self.lock();
        if inner.fail_parts.contains(&part_number) {
            return Err(StorageError::PartFailed(format!(
                "injected failure for part {}",
                part_number
            )));
        }
        let session = inner
            .sessions
            .get_mut(upload_id)
            .ok_or_else(|| StorageError::PartFailed(format!("unknown upload id {}", upload_id)))?;
        if session.key != key {
            return Err(StorageError::PartFailed(format!(
                "upload id {} belongs to a different key",
                upload_id
            )));
        }
        let etag = etag_for(part_number, &data);
        session.parts.insert(part_number, (etag.clone(), data));
        Ok(UploadedPart { part_number, etag })
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<UploadedPart>,
    ) -> StorageResult<CompletedObject> {
        if parts.is_empty() {
            return Err(StorageError::InvalidParts("no parts submitted".to_string()));
        }
        parts.sort_by_key(|p| p.part_number);

        let mut inner = self.lock();
        let session = inner.sessions.get(upload_id).ok_or_else(|| {
            StorageError::CompleteFailed(format!("unknown upload id {}", upload_id))
        })?;
        if session.key != key {
            return Err(StorageError::CompleteFailed(format!(
                "upload id {} belongs to a different key",
                upload_id
            )));
        }

        // The store checks the submitted list against what it recorded: every
        // part present exactly once with a matching etag, numbered 1..=n.
        let mut assembled = Vec::new();
        for (expected, part) in (1..).zip(parts.iter()) {
            if part.part_number != expected {
                return Err(StorageError::InvalidParts(format!(
                    "expected part {}, got {}",
                    expected, part.part_number
                )));
            }
            let (etag, data) = session.parts.get(&part.part_number).ok_or_else(|| {
                StorageError::InvalidParts(format!("part {} was never uploaded", part.part_number))
            })?;
            if *etag != part.etag {
                return Err(StorageError::InvalidParts(format!(
                    "etag mismatch for part {}",
                    part.part_number
                )));
            }
            assembled.extend_from_slice(data);
        }

        // The session carries the content type given at init; the finished
        // object keeps it, same as the real backend.
        let content_type = session.content_type.clone();
        inner.sessions.remove(upload_id);
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                content_type,
                data: Bytes::from(assembled),
            },
        );
        inner.completed_multiparts += 1;

        Ok(CompletedObject {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }
}
