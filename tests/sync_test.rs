//! Sync behavior against a mock HTTP catalog.

use install_triage::sync::SyncCache;
use tempfile::TempDir;

struct Layout {
    _dir: TempDir,
    handlers: std::path::PathBuf,
    marker: std::path::PathBuf,
}

fn layout() -> Layout {
    let dir = TempDir::new().unwrap();
    let handlers = dir.path().join("handlers");
    let marker = dir.path().join("last_sync");
    Layout {
        _dir: dir,
        handlers,
        marker,
    }
}

#[tokio::test]
async fn expired_cache_downloads_missing_rule_files() {
    let mut server = mockito::Server::new_async().await;
    let index = server
        .mock("GET", "/index")
        .with_body("testing_stuff.yml,2024-01-01T00:00:00Z\n")
        .create_async()
        .await;
    let rule_file = server
        .mock("GET", "/testing_stuff.yml")
        .with_body("- versions: all\n  matching: [boom]\n  messages: {en: msg}\n")
        .create_async()
        .await;

    let layout = layout();
    let sync = SyncCache::new(&server.url(), layout.handlers.clone(), layout.marker.clone()).unwrap();

    sync.refresh().await;

    index.assert_async().await;
    rule_file.assert_async().await;

    let downloaded = std::fs::read_to_string(layout.handlers.join("testing_stuff.yml")).unwrap();
    assert!(downloaded.contains("boom"));

    // Marker written, so the sync is throttled from now on
    let stamp = std::fs::read_to_string(&layout.marker).unwrap();
    assert!(stamp.trim().parse::<chrono::DateTime<chrono::Utc>>().is_ok());
}

#[tokio::test]
async fn fresh_marker_skips_the_network_entirely() {
    let mut server = mockito::Server::new_async().await;
    let index = server.mock("GET", "/index").expect(0).create_async().await;

    let layout = layout();
    std::fs::write(&layout.marker, chrono::Utc::now().to_rfc3339()).unwrap();

    let sync = SyncCache::new(&server.url(), layout.handlers.clone(), layout.marker.clone()).unwrap();
    sync.refresh().await;

    index.assert_async().await;
}

#[tokio::test]
async fn local_files_newer_than_the_remote_are_not_downloaded() {
    let mut server = mockito::Server::new_async().await;
    // Remote timestamp far in the past; the freshly written local file wins
    let _index = server
        .mock("GET", "/index")
        .with_body("stale.yml,2000-01-01T00:00:00Z\n")
        .create_async()
        .await;
    let rule_file = server
        .mock("GET", "/stale.yml")
        .expect(0)
        .create_async()
        .await;

    let layout = layout();
    std::fs::create_dir_all(&layout.handlers).unwrap();
    std::fs::write(layout.handlers.join("stale.yml"), "local content").unwrap();

    let sync = SyncCache::new(&server.url(), layout.handlers.clone(), layout.marker.clone()).unwrap();
    sync.refresh().await;

    rule_file.assert_async().await;
    let content = std::fs::read_to_string(layout.handlers.join("stale.yml")).unwrap();
    assert_eq!(content, "local content");
}

#[tokio::test]
async fn failed_sync_is_swallowed_and_leaves_a_detail_file() {
    let mut server = mockito::Server::new_async().await;
    let _index = server
        .mock("GET", "/index")
        .with_status(500)
        .create_async()
        .await;

    let layout = layout();
    let sync = SyncCache::new(&server.url(), layout.handlers.clone(), layout.marker.clone()).unwrap();

    // Must not panic or propagate
    sync.refresh().await;

    // Marker was still written first: no retry storm
    assert!(layout.marker.exists());

    let detail_written = std::fs::read_dir(layout.marker.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("sync-failure-")
        });
    assert!(detail_written, "expected a sync-failure detail file");
}

#[tokio::test]
async fn malformed_index_aborts_without_writing_rule_files() {
    let mut server = mockito::Server::new_async().await;
    let _index = server
        .mock("GET", "/index")
        .with_body("this line has no timestamp\n")
        .create_async()
        .await;

    let layout = layout();
    let sync = SyncCache::new(&server.url(), layout.handlers.clone(), layout.marker.clone()).unwrap();
    sync.refresh().await;

    assert!(!layout.handlers.exists());
}
