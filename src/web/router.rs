//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    browse_files, create_folders, delete_files, delete_folders, download_owned, download_shared,
    file_settings, list_folders, login, logout, move_file, refresh, register, rename_folder,
    upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Room left for multipart framing on top of the upload limit.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route("/logout", post(logout));

    let folder_routes = Router::new().route(
        "/folder",
        get(list_folders)
            .post(create_folders)
            .patch(rename_folder)
            .delete(delete_folders),
    );

    let body_limit = app_state
        .storage
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let file_routes = Router::new()
        .route(
            "/file",
            post(browse_files).patch(file_settings).delete(delete_files),
        )
        .route(
            "/file/upload/:folder_id",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/file/move", post(move_file))
        .route("/file/download/:file_id", get(download_owned))
        .route("/file/:file_id", get(download_shared));

    let cors = create_cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .merge(auth_routes)
        .merge(folder_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
