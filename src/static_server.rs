use std::path::{Component, Path, PathBuf};

use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use mime_guess::from_path;

use crate::core::errors::ApiError;
use crate::AppState;

const INDEX: &str = "index.html";

/// Fallback for every unrouted request.
///
/// With a static directory configured, GETs outside `/api` are served from it and
/// unknown paths fall back to `index.html` so client-side routing works.
pub async fn serve_static(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let path = req.path();
    let root = match &state.settings.static_dir {
        Some(root) if *req.method() == Method::GET && !path.starts_with("/api") => {
            root.clone()
        }
        _ => return Err(ApiError::NotFound("No route found".to_string())),
    };

    let relative = resolve(path).ok_or_else(|| ApiError::NotFound("No route found".to_string()))?;
    let (file, bytes) = web::block(move || read_with_fallback(&root, &relative))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mime = from_path(&file).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .body(bytes))
}

/// Maps a URL path to a relative file path, refusing anything that escapes the root.
fn resolve(url_path: &str) -> Option<PathBuf> {
    let trimmed = url_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Some(PathBuf::from(INDEX));
    }

    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}

fn read_with_fallback(root: &Path, relative: &Path) -> Result<(PathBuf, Vec<u8>), ApiError> {
    let candidate = root.join(relative);
    if candidate.is_file() {
        let bytes = std::fs::read(&candidate).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok((candidate, bytes));
    }

    let index = root.join(INDEX);
    match std::fs::read(&index) {
        Ok(bytes) => Ok((index, bytes)),
        Err(_) => Err(ApiError::NotFound("No route found".to_string())),
    }
}
