// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Public image endpoints are
//! merged with the JWT-protected admin surface.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use snapbin_core::SnapbinError;
use snapbin_storage::Database;
use snapbin_tasks::TaskProducer;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, JwtManager};
use crate::handlers;

/// Gateway configuration (mirrors the relevant `snapbin-config` sections to
/// avoid a config-crate dependency from the gateway crate).
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory uploaded files are written to.
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes.
    pub max_file_size_bytes: u64,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// SQLite handle for users and images.
    pub db: Arc<Database>,
    /// Enqueue side of the task pipeline.
    pub producer: TaskProducer,
    /// Token signer/verifier.
    pub jwt: Arc<JwtManager>,
    /// Upload settings.
    pub settings: Arc<GatewaySettings>,
}

/// Assemble the full route tree for the given state.
pub fn router(state: AppState) -> Router {
    // Public routes: health, login, and the anonymous image surface.
    let public_routes = Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/images/code/{code}", get(handlers::images::get_by_code))
        .route("/api/v1/images/file/{code}", get(handlers::images::serve_file))
        .route("/api/v1/images/random", get(handlers::images::random))
        .route("/api/v1/images/task/{task_id}", get(handlers::images::task_status))
        .with_state(state.clone());

    // Routes requiring a valid bearer token.
    let api_routes = Router::new()
        .route(
            "/api/v1/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/api/v1/users/{id}",
            get(handlers::users::get)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route(
            "/api/v1/auth/profile",
            get(handlers::auth::profile).put(handlers::auth::update_profile),
        )
        .route("/api/v1/images/upload", post(handlers::images::upload))
        .route("/api/v1/images", get(handlers::images::list))
        .route(
            "/api/v1/images/{id}",
            get(handlers::images::get).delete(handlers::images::delete),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    // Multipart bodies carry the image plus form fields; leave headroom
    // beyond the raw file cap.
    let body_limit = state.settings.max_file_size_bytes as usize + 64 * 1024;

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `cancel` fires.
pub async fn start_server(state: AppState, cancel: CancellationToken) -> Result<(), SnapbinError> {
    let addr = format!("{}:{}", state.settings.host, state.settings.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SnapbinError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| SnapbinError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
