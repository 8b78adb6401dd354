//! Asset routes and response middleware
//!
//! Provides HTTP handlers that resolve request paths against the served
//! root directory with explicit directory-escape protection, plus the
//! middleware that applies cache, sniffing, and logging policy to every
//! response.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as RequestPath, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Shared state for the asset handlers
#[derive(Clone)]
pub struct AssetState {
    /// Canonicalized root directory all requests are resolved under
    pub root: Arc<PathBuf>,
    /// Emit revalidation-forcing cache headers on every response
    pub no_cache: bool,
    /// Log every request/response pair
    pub verbose: bool,
}

/// Serve the entry point document
///
/// Route: GET /
pub async fn serve_index(State(state): State<AssetState>) -> Response {
    serve_relative(&state, "index.html").await
}

/// Serve an asset by path relative to the root directory
///
/// Route: GET /*path
pub async fn serve_asset(
    State(state): State<AssetState>,
    RequestPath(path): RequestPath<String>,
) -> Response {
    serve_relative(&state, &path).await
}

async fn serve_relative(state: &AssetState, raw: &str) -> Response {
    let Some(mut resolved) = sanitize_request_path(&state.root, raw) else {
        tracing::warn!(path = raw, "rejected request escaping the asset root");
        return plain_response(StatusCode::NOT_FOUND, "Not found");
    };

    // Directory requests fall through to their entry point.
    let is_dir = tokio::fs::metadata(&resolved)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if is_dir {
        resolved.push("index.html");
    }

    // Canonicalize so a symlink inside the root cannot point outside it.
    let canonical = match tokio::fs::canonicalize(&resolved).await {
        Ok(path) => path,
        Err(_) => return plain_response(StatusCode::NOT_FOUND, "Not found"),
    };
    if !canonical.starts_with(state.root.as_ref()) {
        tracing::warn!(path = raw, "rejected symlinked path escaping the asset root");
        return plain_response(StatusCode::NOT_FOUND, "Not found");
    }

    match tokio::fs::read(&canonical).await {
        Ok(data) => {
            let headers = [(header::CONTENT_TYPE, content_type_for(&canonical).to_string())];
            (StatusCode::OK, headers, data).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            plain_response(StatusCode::NOT_FOUND, "Not found")
        }
        Err(e) => {
            tracing::error!(path = %canonical.display(), error = %e, "failed to read asset");
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn plain_response(status: StatusCode, body: &'static str) -> Response {
    let headers = [(header::CONTENT_TYPE, "text/plain".to_string())];
    (status, headers, body).into_response()
}

/// Resolve a slash-separated request path under `root`
///
/// Rejects anything that could step outside the root before the filesystem
/// is consulted: `..` segments, backslashes, NUL bytes, and segments that
/// parse as more than one path component (drive prefixes and the like).
/// Empty and `.` segments are skipped.
pub(crate) fn sanitize_request_path(root: &Path, raw: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for segment in raw.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => resolved.push(segment),
            _ => return None,
        }
    }
    Some(resolved)
}

/// Response policy middleware
///
/// This middleware:
/// 1. Marks every response with `X-Content-Type-Options: nosniff`
/// 2. Adds revalidation-forcing cache headers when `no_cache` is set
/// 3. Logs the request/response pair when `verbose` is set
pub async fn response_policy_middleware(
    State(state): State<AssetState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    if state.no_cache {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }

    if state.verbose {
        tracing::info!(%method, path, status = %response.status(), "request served");
    }

    response
}

/// MIME type inferred from the file extension
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_inference() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("static/js/main.3f2a.js")),
            "text/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("font.woff2")), "font/woff2");
        assert_eq!(
            content_type_for(Path::new("archive.bin")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        assert_eq!(content_type_for(Path::new("LOGO.PNG")), "image/png");
    }

    #[test]
    fn test_sanitize_plain_paths() {
        let root = Path::new("/srv/frontend");
        assert_eq!(
            sanitize_request_path(root, "static/app.js"),
            Some(PathBuf::from("/srv/frontend/static/app.js"))
        );
        // Empty and `.` segments collapse
        assert_eq!(
            sanitize_request_path(root, "a//./b"),
            Some(PathBuf::from("/srv/frontend/a/b"))
        );
        assert_eq!(
            sanitize_request_path(root, ""),
            Some(PathBuf::from("/srv/frontend"))
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        let root = Path::new("/srv/frontend");
        assert!(sanitize_request_path(root, "../secret.txt").is_none());
        assert!(sanitize_request_path(root, "a/../../secret.txt").is_none());
        assert!(sanitize_request_path(root, "..").is_none());
        assert!(sanitize_request_path(root, "a/..\\b").is_none());
        assert!(sanitize_request_path(root, "a\\b").is_none());
        assert!(sanitize_request_path(root, "a\0b").is_none());
    }
}
