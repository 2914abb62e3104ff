//! Shared key generation for storage backends.
//!
//! Key format: `{folder}/{timestamp_ms}-{random}.{ext}`. The millisecond
//! timestamp plus a 13-character random suffix guarantees uniqueness without a
//! collision check against the store.

use rand::Rng;

const RANDOM_SUFFIX_LEN: usize = 13;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..RANDOM_SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Generate a storage key for an upload of `filename` into `folder`.
///
/// A trailing slash on the folder is trimmed; a filename without an extension
/// falls back to `bin`.
pub fn generate_object_key(folder: &str, filename: &str) -> String {
    let folder = folder.trim_end_matches('/');
    let ext = filename
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != filename)
        .unwrap_or("bin")
        .to_lowercase();
    let timestamp = chrono::Utc::now().timestamp_millis();
    format!("{}/{}-{}.{}", folder, timestamp, random_suffix(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_has_folder_timestamp_and_extension() {
        let key = generate_object_key("article", "photo.JPG");
        assert!(key.starts_with("article/"));
        assert!(key.ends_with(".jpg"));
        let name = key.strip_prefix("article/").unwrap();
        let (stem, _ext) = name.rsplit_once('.').unwrap();
        let (timestamp, suffix) = stem.split_once('-').unwrap();
        assert!(timestamp.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 13);
    }

    #[test]
    fn trailing_slash_in_folder_is_trimmed() {
        let key = generate_object_key("gallery/", "a.png");
        assert!(key.starts_with("gallery/"));
        assert!(!key.contains("//"));
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        let key = generate_object_key("uploads", "README");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn keys_are_unique_across_calls() {
        let a = generate_object_key("uploads", "a.png");
        let b = generate_object_key("uploads", "a.png");
        assert_ne!(a, b);
    }
}
