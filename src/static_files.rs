/// Static file serving for the map client.
///
/// Directories are served through their `index.html` only; there are no
/// directory listings. Any path that tries to climb out of the root is
/// answered as not found.

use crate::endpoint::ApiResponse;
use crate::model::ServiceError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tiny_http::Method;

/// Serves `url_path` from under `root`.
pub fn serve(root: &Path, method: &Method, url_path: &str) -> ApiResponse {
    if !matches!(method, Method::Get | Method::Head) {
        return ApiResponse::error(&ServiceError::MethodNotAllowed);
    }

    let Some(path) = resolve(root, url_path) else {
        log::debug!("Rejected static path {:?}", url_path);
        return ApiResponse::error(&ServiceError::NotFound);
    };

    match fs::read(&path) {
        Ok(body) => ApiResponse::new(200, content_type(&path), body),
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("Failed to read {}: {}", path.display(), e);
            }
            ApiResponse::error(&ServiceError::NotFound)
        }
    }
}

/// Maps a URL path to a file under `root`, or `None` if it cannot be served.
///
/// Percent-escapes are decoded before the `..` check, so `%2e%2e` is
/// caught too. A directory resolves to its `index.html`, which must exist.
pub fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') || s.contains(':') => return None,
            s => path.push(s),
        }
    }

    if path.is_dir() {
        path.push("index.html");
    }
    path.is_file().then_some(path)
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json",
        "geojson" => "application/geo+json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
