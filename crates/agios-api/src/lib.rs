pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sse;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use agios_types::{MAX_FILES_PER_MESSAGE, MAX_FILE_SIZE_BYTES};

use crate::config::CorsConfig;
use crate::middleware::logging as request_logging;
use crate::openapi::ApiDoc;
use crate::routes::{files, health, messages, threads};
use crate::state::AppState;

/// Room for the largest legal upload plus multipart framing
const UPLOAD_BODY_LIMIT: usize = (MAX_FILE_SIZE_BYTES as usize) * (MAX_FILES_PER_MESSAGE + 1);

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Threads
        .route("/threads", post(threads::create_thread))
        .route("/threads/:thread_id", get(threads::get_thread))
        .route("/threads/:thread_id", delete(threads::delete_thread))
        // Messages
        .route("/messages/:message_id", delete(messages::delete_message))
        // Files
        .route(
            "/files/upload",
            post(files::upload_files).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(request_logging::log_request))
        .layer(TimeoutLayer::new(state.config.server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .origins
            .iter()
            .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
