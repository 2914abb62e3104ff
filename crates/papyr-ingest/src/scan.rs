//! Textual scanning for image references.
//!
//! Extraction is a pair of regular expressions over raw text, not a markdown
//! AST walk. Both supported syntaxes can appear anywhere in the content,
//! including inside other markup.

use regex::Regex;
use std::sync::LazyLock;

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").expect("valid regex"));

static HTML_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("valid regex"));

/// Extract every image URL referenced via `![alt](url)` or `<img src="url">`,
/// in document order (markdown matches first, then HTML matches). Duplicates
/// are preserved; deduplication is the pipeline's concern.
pub fn extract_image_urls(content: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for caps in MARKDOWN_IMAGE.captures_iter(content) {
        urls.push(caps[1].trim().to_string());
    }
    for caps in HTML_IMAGE.captures_iter(content) {
        urls.push(caps[1].trim().to_string());
    }
    urls
}

/// Whether a URL is an external candidate for migration.
///
/// URLs containing the owned marker (bucket name or custom domain) are already
/// ours and are never re-uploaded, which makes ingestion idempotent. Anything
/// else counts as external iff it is an absolute http(s) URL.
pub fn is_external_url(url: &str, owned_marker: &str) -> bool {
    if !owned_marker.is_empty() && url.contains(owned_marker) {
        return false;
    }
    url.starts_with("http://") || url.starts_with("https://")
}

/// Derive a filename from the URL's path. Falls back to `image.jpg` when the
/// path has no usable final segment.
pub fn filename_from_url(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let path = match without_scheme.split_once('/') {
        Some((_host, rest)) => rest,
        None => return "image.jpg".to_string(),
    };
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .unwrap_or_else(|| "image.jpg".to_string())
}

/// Extension-based content-type guess, used when the origin server does not
/// report one.
pub fn guess_content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "image/jpeg",
    }
}
