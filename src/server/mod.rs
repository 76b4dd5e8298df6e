//! Development server for the generated site

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    middleware,
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Address the development server listens on
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8080);

/// Router serving `public_dir`, with browser caching disabled so a refresh
/// always shows the latest build
pub fn router(public_dir: &Path) -> Router {
    let files = ServeDir::new(public_dir).append_index_html_on_directories(true);

    Router::new()
        .fallback_service(files)
        .layer(middleware::map_response(disable_caching))
        .layer(TraceLayer::new_for_http())
}

async fn disable_caching(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

/// Serve `public_dir` on `addr` until the process stops
pub async fn start(public_dir: &Path, addr: SocketAddr) -> Result<()> {
    let app = router(public_dir);

    println!("Server running at http://{}", addr);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
