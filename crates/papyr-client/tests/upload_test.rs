//! End-to-end tests: the client orchestrator against a real server instance
//! backed by the in-memory store.

use bytes::Bytes;
use papyr_api::AppState;
use papyr_client::{ApiClient, UploadOptions};
use papyr_core::Config;
use papyr_storage::MemoryStore;
use std::sync::{Arc, Mutex};

const TOKEN: &str = "client-test-token";
const MIB: usize = 1024 * 1024;

fn server_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        admin_token: TOKEN.to_string(),
        cors_origins: vec![],
        s3_bucket: "blog-media".to_string(),
        s3_region: "ap-shanghai".to_string(),
        s3_endpoint: None,
        s3_custom_domain: Some("memory.test".to_string()),
        upload_folder: "article".to_string(),
        batch_upload_folder: "gallery".to_string(),
    }
}

async fn spawn_server() -> (String, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(server_config(), Arc::new(store.clone())).expect("build state");
    let app = papyr_api::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{}", addr), store)
}

fn patterned(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
}

fn progress_recorder() -> (Arc<Mutex<Vec<u8>>>, papyr_client::ProgressFn) {
    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: papyr_client::ProgressFn = Arc::new(move |percent| {
        sink.lock().unwrap().push(percent);
    });
    (seen, callback)
}

#[tokio::test]
async fn chunked_upload_round_trip() {
    let (base_url, store) = spawn_server().await;
    let client = ApiClient::new(base_url, TOKEN.to_string()).expect("client");
    let data = patterned(12 * MIB);
    let (seen, on_progress) = progress_recorder();

    let outcome = client
        .upload_file(
            "movie.mp4",
            "video/mp4",
            data.clone(),
            UploadOptions {
                part_size: 5 * MIB,
                concurrency: 3,
                media_type: Some("video".to_string()),
                on_progress: Some(on_progress),
                ..Default::default()
            },
        )
        .await;

    assert!(outcome.success, "upload failed: {:?}", outcome.error);
    let url = outcome.url.expect("url");
    assert!(url.starts_with("https://memory.test/article/"));
    assert!(url.ends_with(".mp4"));

    // The assembled object is byte-identical to the input.
    let key = url.strip_prefix("https://memory.test/").expect("key");
    assert_eq!(store.object(key).expect("object"), data);
    assert_eq!(store.completed_multipart_count(), 1);
    assert_eq!(store.open_multipart_count(), 0);

    // Progress is monotonic and finishes at 100.
    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", *seen);
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test]
async fn chunked_progress_reports_each_part_in_order() {
    let (base_url, _store) = spawn_server().await;
    let client = ApiClient::new(base_url, TOKEN.to_string()).expect("client");
    let data = patterned(25 * MIB);
    let (seen, on_progress) = progress_recorder();

    let outcome = client
        .upload_file(
            "movie.mp4",
            "video/mp4",
            data,
            UploadOptions {
                part_size: 5 * MIB,
                concurrency: 5,
                media_type: Some("video".to_string()),
                on_progress: Some(on_progress),
                ..Default::default()
            },
        )
        .await;

    assert!(outcome.success, "upload failed: {:?}", outcome.error);
    // One callback per finished part, strictly in order, even with all five
    // parts in flight at once.
    assert_eq!(*seen.lock().unwrap(), vec![20, 40, 60, 80, 100]);
}

#[tokio::test]
async fn failed_part_aborts_without_completing() {
    let (base_url, store) = spawn_server().await;
    store.fail_part_number(2);
    let client = ApiClient::new(base_url, TOKEN.to_string()).expect("client");
    let data = patterned(12 * MIB);

    let outcome = client
        .upload_file(
            "movie.mp4",
            "video/mp4",
            data,
            UploadOptions {
                part_size: 5 * MIB,
                concurrency: 3,
                media_type: Some("video".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert!(outcome.url.is_none());
    // The session was never completed, so no partial object is visible.
    assert_eq!(store.completed_multipart_count(), 0);
    assert_eq!(store.object_count(), 0);
}

#[tokio::test]
async fn small_file_goes_direct() {
    let (base_url, store) = spawn_server().await;
    let client = ApiClient::new(base_url, TOKEN.to_string()).expect("client");
    let data = patterned(2 * 1024);
    let (seen, on_progress) = progress_recorder();

    let outcome = client
        .upload_file(
            "pixel.png",
            "image/png",
            data.clone(),
            UploadOptions {
                on_progress: Some(on_progress),
                ..Default::default()
            },
        )
        .await;

    assert!(outcome.success, "upload failed: {:?}", outcome.error);
    assert_eq!(outcome.name.as_deref(), Some("pixel.png"));
    assert_eq!(store.object_count(), 1);
    // No multipart session was ever opened for a small file.
    assert_eq!(store.open_multipart_count(), 0);
    assert_eq!(store.completed_multipart_count(), 0);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test]
async fn wrong_token_surfaces_as_failed_outcome() {
    let (base_url, store) = spawn_server().await;
    let client = ApiClient::new(base_url, "not-the-token".to_string()).expect("client");

    let outcome = client
        .upload_file(
            "pixel.png",
            "image/png",
            patterned(1024),
            UploadOptions::default(),
        )
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.expect("error").contains("401"));
    assert_eq!(store.object_count(), 0);
}
