//! Ingestion pipeline tests against an in-memory store and a throwaway HTTP
//! server that plays the role of the external image host.

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use papyr_ingest::ImageIngestor;
use papyr_storage::MemoryStore;
use std::sync::Arc;

const OWNED_MARKER: &str = "memory.test";

async fn serve_jpeg() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/jpeg")], vec![0xffu8, 0xd8, 0xff, 0xe0])
}

async fn serve_untyped() -> impl IntoResponse {
    // No usable content type; the ingestor should guess from the extension.
    ([(header::CONTENT_TYPE, "")], vec![1u8, 2, 3])
}

/// Spawns an image host on 127.0.0.1 and returns its base URL.
async fn spawn_image_host() -> String {
    let app = Router::new()
        .route("/cat.jpg", get(serve_jpeg))
        .route("/photos/dog.png", get(serve_untyped));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind image host");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve image host");
    });
    format!("http://{}", addr)
}

fn ingestor(store: &MemoryStore) -> ImageIngestor {
    ImageIngestor::new(
        Arc::new(store.clone()),
        OWNED_MARKER.to_string(),
        "article".to_string(),
    )
    .expect("build ingestor")
}

#[tokio::test]
async fn duplicate_references_upload_once_and_rewrite_everywhere() {
    let host = spawn_image_host().await;
    let store = MemoryStore::new();
    let content = format!(
        "![a]({host}/cat.jpg) and ![b]({host}/cat.jpg) and <img src=\"{host}/cat.jpg\">"
    );

    let outcome = ingestor(&store).ingest(&content).await;

    assert_eq!(outcome.uploaded_count, 1);
    assert_eq!(store.object_count(), 1);
    assert!(!outcome.content.contains(&host));
    assert_eq!(outcome.content.matches(OWNED_MARKER).count(), 3);

    // All three occurrences point at the same owned URL.
    let owned_url = outcome
        .content
        .split(['(', ')', '"'])
        .find(|s| s.contains(OWNED_MARKER))
        .expect("owned url in content")
        .to_string();
    assert_eq!(outcome.content.matches(owned_url.as_str()).count(), 3);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let host = spawn_image_host().await;
    let store = MemoryStore::new();
    let content = format!("![cat]({host}/cat.jpg)");

    let first = ingestor(&store).ingest(&content).await;
    assert_eq!(first.uploaded_count, 1);

    let second = ingestor(&store).ingest(&first.content).await;
    assert_eq!(second.uploaded_count, 0);
    assert_eq!(second.content, first.content);
    assert_eq!(store.object_count(), 1);
}

#[tokio::test]
async fn failed_download_leaves_original_url_in_place() {
    let host = spawn_image_host().await;
    let store = MemoryStore::new();
    let content = format!("![ok]({host}/cat.jpg) ![gone]({host}/missing.jpg)");

    let outcome = ingestor(&store).ingest(&content).await;

    assert_eq!(outcome.uploaded_count, 1);
    assert!(outcome.content.contains(&format!("{host}/missing.jpg")));
    assert!(!outcome.content.contains(&format!("{host}/cat.jpg")));
}

#[tokio::test]
async fn store_failure_is_contained_per_url() {
    let host = spawn_image_host().await;
    let store = MemoryStore::new();
    store.fail_puts(true);
    let content = format!("![cat]({host}/cat.jpg)");

    let outcome = ingestor(&store).ingest(&content).await;

    assert_eq!(outcome.uploaded_count, 0);
    assert_eq!(outcome.content, content);
}

#[tokio::test]
async fn head_content_type_preferred_with_extension_fallback() {
    let host = spawn_image_host().await;
    let store = MemoryStore::new();
    let content = format!("![a]({host}/cat.jpg) ![b]({host}/photos/dog.png)");

    let outcome = ingestor(&store).ingest(&content).await;
    assert_eq!(outcome.uploaded_count, 2);
    assert_eq!(store.object_count(), 2);

    // Generated keys embed a timestamp, so recover them from the rewritten
    // URLs instead of predicting them.
    let keys: Vec<&str> = outcome
        .content
        .split(['(', ')', '"', ' '])
        .filter_map(|s| s.strip_prefix("https://memory.test/"))
        .collect();
    assert_eq!(keys.len(), 2);

    let jpg_key = keys.iter().find(|k| k.ends_with(".jpg")).expect("jpg key");
    let png_key = keys.iter().find(|k| k.ends_with(".png")).expect("png key");
    // cat.jpg's host reported image/jpeg on HEAD; dog.png's host reported
    // nothing usable, so the extension guess applies.
    assert_eq!(store.object_content_type(jpg_key).as_deref(), Some("image/jpeg"));
    assert_eq!(store.object_content_type(png_key).as_deref(), Some("image/png"));
}

#[tokio::test]
async fn relative_and_data_urls_are_ignored() {
    let store = MemoryStore::new();
    let content = "![a](/local/a.jpg) <img src=\"data:image/png;base64,AAAA\">";

    let outcome = ingestor(&store).ingest(content).await;

    assert_eq!(outcome.uploaded_count, 0);
    assert_eq!(outcome.content, content);
    assert_eq!(store.object_count(), 0);
}
