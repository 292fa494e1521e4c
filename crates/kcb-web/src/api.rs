use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug, info};

use kcb_core::security::resolve_within;

use crate::error::WebError;

const INDEX_PAGE: &str = "index.html";

#[derive(Clone)]
pub struct WebState {
    pub public_dir: Arc<PathBuf>,
    pub static_dir: Arc<PathBuf>,
}

impl WebState {
    pub fn new(public_dir: impl Into<PathBuf>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: Arc::new(public_dir.into()),
            static_dir: Arc::new(static_dir.into()),
        }
    }
}

pub fn build_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/static/*path", get(static_file))
        .merge(public_routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gallery files change on every upload and are read cross-origin.
fn public_routes() -> Router<WebState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/public/*path", get(public_file))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(cors)
}

async fn index_page(State(state): State<WebState>) -> Result<Response, WebError> {
    serve_file(&state.static_dir, INDEX_PAGE).await
}

async fn static_file(
    State(state): State<WebState>,
    Path(path): Path<String>,
) -> Result<Response, WebError> {
    serve_file(&state.static_dir, &path).await
}

async fn public_file(
    State(state): State<WebState>,
    Path(path): Path<String>,
) -> Result<Response, WebError> {
    serve_file(&state.public_dir, &path).await
}

async fn not_found() -> WebError {
    WebError::NotFound
}

async fn serve_file(root: &FsPath, requested: &str) -> Result<Response, WebError> {
    let Some(path) = resolve_within(root, requested) else {
        debug!(path = %requested, "Rejected request path");
        return Err(WebError::NotFound);
    };

    if !tokio::fs::metadata(&path).await?.is_file() {
        return Err(WebError::NotFound);
    }
    let body = tokio::fs::read(&path).await?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], body).into_response())
}

fn content_type_for(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "json" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

pub async fn serve(state: WebState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Web server started");
    axum::serve(listener, app).await?;

    Ok(())
}
