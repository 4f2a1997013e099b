//! API routes

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// CORS policy from `PAPERO_CORS_ORIGINS`
///
/// `*` allows any origin, a comma-separated list allows those origins, and
/// when unset only local development origins are allowed.
fn cors_layer(origins: Option<String>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) if origins.trim() == "*" => AllowOrigin::any(),
        Some(origins) => AllowOrigin::list(
            origins
                .split(',')
                .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ),
        None => AllowOrigin::list(DEV_ORIGINS.map(HeaderValue::from_static)),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalogue
        .route("/books", get(handlers::list_books).post(handlers::add_book))
        // Library
        .route(
            "/library",
            get(handlers::list_library).post(handlers::acquire_book),
        )
        // Reading session
        .route("/content-resolution", get(handlers::resolve_content))
        .route("/progress", post(handlers::save_progress))
        .route("/accessed", post(handlers::touch_accessed))
        // SSE endpoint
        .route("/sync", get(handlers::sync_events));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(std::env::var("PAPERO_CORS_ORIGINS").ok())),
        )
        .with_state(state)
}
