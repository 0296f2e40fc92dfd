//! Route configuration and setup

use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tubely_core::{Config, StorageBackend};

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .merge(upload_routes(config))
        .route(
            &format!("{}/videos/{{id}}", API_PREFIX),
            get(handlers::video_get::get_video),
        )
        .route(
            &format!("{}/thumbnails/{{id}}", API_PREFIX),
            get(handlers::thumbnail_get::get_thumbnail),
        )
        .route("/health", get(handlers::health::health_check))
        .nest_service("/assets", ServeDir::new(&config.assets_root));

    let app = match local_media_route(config) {
        Some((route, dir)) => {
            tracing::info!(route = %route, dir = %dir, "Serving local storage");
            app.nest_service(&route, ServeDir::new(dir))
        }
        None => app,
    };

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Upload routes stream their bodies; axum's 2 MB default is replaced by a
/// per-route cap of the field limit plus multipart framing.
fn upload_routes(config: &Config) -> Router<Arc<AppState>> {
    let thumbnail_limit = config
        .max_thumbnail_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let video_limit = config
        .max_video_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let thumbnail = Router::new()
        .route(
            &format!("{}/videos/{{id}}/thumbnail", API_PREFIX),
            post(handlers::thumbnail_upload::upload_thumbnail),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(thumbnail_limit));

    let video = Router::new()
        .route(
            &format!("{}/videos/{{id}}/video", API_PREFIX),
            post(handlers::video_upload::upload_video),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(video_limit));

    thumbnail.merge(video)
}

/// With the local backend, serve its directory when its base URL lives on this server.
fn local_media_route(config: &Config) -> Option<(String, String)> {
    if config.storage_backend != StorageBackend::Local {
        return None;
    }
    let dir = config.local_storage_path.clone()?;
    let route = config
        .local_storage_base_url
        .as_deref()?
        .strip_prefix(config.public_base_url.as_str())?
        .trim_end_matches('/')
        .to_string();

    let reserved = route.is_empty() || route == "/assets" || route.starts_with(API_PREFIX);
    if !route.starts_with('/') || route[1..].contains('/') || reserved {
        return None;
    }
    Some((route, dir))
}
