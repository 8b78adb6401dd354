//! Tests for the asset server module
//!
//! Covers the lifecycle state machine, port-conflict recovery, shutdown
//! idempotence, and directory-escape protection against real sockets on
//! ephemeral ports.

use std::net::TcpListener as StdTcpListener;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::routes::sanitize_request_path;
use super::{ServerConfig, ServerError, ServerOptions, ServerStatus, StaticAssetServer, StopOutcome};

const INDEX_BODY: &str = "<html><body>kiosk frontend</body></html>";

/// Build a frontend-like asset tree in a temp directory
fn asset_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_BODY).unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('kiosk');").unwrap();
    std::fs::create_dir(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static/styles.css"), "body { margin: 0; }").unwrap();
    std::fs::write(dir.path().join("static/index.html"), "<html>nested</html>").unwrap();
    dir
}

/// Ephemeral port that was free at the time of the call
fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config with test-friendly timeouts
fn test_config(root: &Path, port: u16) -> ServerConfig {
    ServerConfig::new(root, port).with_options(ServerOptions {
        retry_grace: Duration::from_millis(100),
        verify_timeout: Duration::from_millis(500),
        drain_timeout: Duration::from_secs(2),
        ..ServerOptions::default()
    })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Issue a GET with a raw request line, bypassing client-side URL
/// normalization (needed to exercise literal `..` targets).
async fn raw_get(port: u16, target: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .unwrap();
    let request = format!(
        "GET {target} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_serves_entry_point_after_start() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));

    server.start().await.unwrap();
    assert_eq!(server.status(), ServerStatus::Running);

    let response = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    assert_eq!(
        response.headers()["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.text().await.unwrap(), INDEX_BODY);

    server.stop().await;
}

#[tokio::test]
async fn test_serves_nested_assets_with_inferred_mime() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));
    server.start().await.unwrap();

    let response = client()
        .get(format!("http://127.0.0.1:{port}/static/styles.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");

    // Directory path falls through to its entry point
    let response = client()
        .get(format!("http://127.0.0.1:{port}/static"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "<html>nested</html>");

    let response = client()
        .get(format!("http://127.0.0.1:{port}/no-such-file.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_missing_root_fails_before_bind() {
    let port = free_port();
    let server = StaticAssetServer::new(test_config(Path::new("/nonexistent/frontend"), port));

    let err = server.start().await.unwrap_err();
    assert!(matches!(err, ServerError::AssetMissing { .. }));
    assert!(err.is_fatal());
    assert_eq!(server.status(), ServerStatus::Stopped);

    // The port was never touched and can be bound directly.
    let probe = StdTcpListener::bind(("0.0.0.0", port));
    assert!(probe.is_ok());
}

#[tokio::test]
async fn test_missing_entry_point_rejected() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("app.js"), "// no index.html here").unwrap();
    let server = StaticAssetServer::new(test_config(root.path(), free_port()));

    let err = server.start().await.unwrap_err();
    match err {
        ServerError::AssetMissing { path } => {
            assert!(path.ends_with("index.html"));
        }
        other => panic!("expected AssetMissing, got {other}"),
    }
}

#[tokio::test]
async fn test_port_in_use_surfaces_after_single_retry() {
    let root = asset_root();
    let port = free_port();
    // Occupy the port for the whole test.
    let _blocker = StdTcpListener::bind(("0.0.0.0", port)).unwrap();

    let server = StaticAssetServer::new(test_config(root.path(), port));
    let err = server.start().await.unwrap_err();
    assert!(matches!(err, ServerError::PortInUse { port: p } if p == port));
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn test_bind_retry_succeeds_when_port_released_within_grace() {
    let root = asset_root();
    let port = free_port();
    let blocker = StdTcpListener::bind(("0.0.0.0", port)).unwrap();

    // Release the port partway through the grace period.
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        drop(blocker);
    });

    let mut config = test_config(root.path(), port);
    config.options.retry_grace = Duration::from_secs(2);
    let server = StaticAssetServer::new(config);

    server.start().await.unwrap();
    assert_eq!(server.status(), ServerStatus::Running);
    server.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let root = asset_root();
    let server = StaticAssetServer::new(test_config(root.path(), free_port()));
    server.start().await.unwrap();

    assert_eq!(server.stop().await, StopOutcome::Stopped);
    assert_eq!(server.status(), ServerStatus::Stopped);
    assert_eq!(server.stop().await, StopOutcome::AlreadyStopped);
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let root = asset_root();
    let server = StaticAssetServer::new(test_config(root.path(), free_port()));
    assert_eq!(server.stop().await, StopOutcome::AlreadyStopped);
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[tokio::test]
async fn test_immediate_rebind_after_stop() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));

    server.start().await.unwrap();
    server.stop().await;

    // reuse_address is on by default; the same port binds right away.
    server.start().await.unwrap();
    let response = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    server.stop().await;
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let root = asset_root();
    let server = StaticAssetServer::new(test_config(root.path(), free_port()));
    server.start().await.unwrap();

    let err = server.start().await.unwrap_err();
    assert!(matches!(
        err,
        ServerError::AlreadyRunning {
            status: ServerStatus::Running
        }
    ));
    // The original instance is unaffected.
    assert_eq!(server.status(), ServerStatus::Running);
    server.stop().await;
}

#[tokio::test]
async fn test_request_before_stop_completes() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));
    server.start().await.unwrap();

    let url = format!("http://127.0.0.1:{port}/");
    let in_flight = tokio::spawn(async move { client().get(url).send().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let outcome = server.stop().await;
    assert_eq!(outcome, StopOutcome::Stopped);

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_connection_refused_after_stop() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));
    server.start().await.unwrap();
    server.stop().await;

    let result = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_traversal_requests_are_rejected() {
    let outer = TempDir::new().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "do not serve").unwrap();
    let root_path = outer.path().join("build");
    std::fs::create_dir(&root_path).unwrap();
    std::fs::write(root_path.join("index.html"), INDEX_BODY).unwrap();

    let port = free_port();
    let server = StaticAssetServer::new(test_config(&root_path, port));
    server.start().await.unwrap();

    // Literal `..` in the request line (clients normalize this; raw bytes
    // do not).
    let response = raw_get(port, "/../secret.txt").await;
    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(!response.contains("do not serve"));

    // Percent-encoded variant decoded by the router.
    let response = raw_get(port, "/%2e%2e/secret.txt").await;
    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(!response.contains("do not serve"));

    server.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escaping_root_is_rejected() {
    let outer = TempDir::new().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "do not serve").unwrap();
    let root_path = outer.path().join("build");
    std::fs::create_dir(&root_path).unwrap();
    std::fs::write(root_path.join("index.html"), INDEX_BODY).unwrap();
    std::os::unix::fs::symlink(outer.path().join("secret.txt"), root_path.join("leak.txt"))
        .unwrap();

    let port = free_port();
    let server = StaticAssetServer::new(test_config(&root_path, port));
    server.start().await.unwrap();

    let response = client()
        .get(format!("http://127.0.0.1:{port}/leak.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_cors_headers_when_enabled() {
    let root = asset_root();
    let port = free_port();
    let server = StaticAssetServer::new(test_config(root.path(), port));
    server.start().await.unwrap();

    let response = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    server.stop().await;
}

mod sanitize_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        // Any request containing a `..` segment is rejected outright.
        #[test]
        fn prop_parent_segments_rejected(
            prefix in prop::collection::vec("[a-z0-9]{1,8}", 0..4),
            suffix in prop::collection::vec("[a-z0-9]{1,8}", 0..4),
        ) {
            let mut segments = prefix;
            segments.push("..".to_string());
            segments.extend(suffix);
            let raw = segments.join("/");
            prop_assert!(sanitize_request_path(Path::new("/srv/frontend"), &raw).is_none());
        }

        // Any accepted request resolves to a path under the root.
        #[test]
        fn prop_accepted_paths_stay_under_root(
            segments in prop::collection::vec("[a-z0-9][a-z0-9._-]{0,12}", 0..6),
        ) {
            let root = Path::new("/srv/frontend");
            let raw = segments.join("/");
            let resolved = sanitize_request_path(root, &raw);
            if let Some(path) = resolved {
                prop_assert!(path.starts_with(root));
            }
        }
    }
}
