use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;

pub mod content_type;
pub mod dto;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod ingest;
pub mod keys;
pub mod model;
pub mod optimizer;
pub mod publisher;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    // The body cap replaces axum's 2 MB default for this route only.
    let body_limit = usize::try_from(state.config.upload.max_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/videos/{id}/upload", post(handler::upload_video))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
