//! Router assembly: HTTP endpoints, static files, CORS, upload size limit, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Room for multipart framing and base64 expansion on top of the raw file limit.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router with:
/// - upload endpoints (multipart, legacy serverless path, base64 JSON)
/// - health check under `/api/v1/health`
/// - Static SPA from `./static` with index fallback
/// - CORS (any origin, POST/OPTIONS, Content-Type)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    // base64 inflates by 4/3
    let body_limit = state.config.limits.max_file_bytes / 3 * 4 + BODY_OVERHEAD_BYTES;

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/process-pdf", post(http::http_post_process_pdf))
        .route("/.netlify/functions/process-pdf", post(http::http_post_process_pdf))
        .route("/api/process-pdf/base64", post(http::http_post_process_pdf_base64))
        // State + body limit + CORS + HTTP tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
