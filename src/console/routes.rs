use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::server::AppState;

/// Service and endpoint pages
pub fn console_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/services/new",
            get(handlers::new_service).post(handlers::store_service),
        )
        .route("/services/:name", get(handlers::show_service))
        .route(
            "/services/:name/delete",
            get(handlers::delete_service).post(handlers::destroy_service),
        )
        // Endpoint routes
        .route(
            "/services/:name/endpoints/new",
            get(handlers::new_endpoint).post(handlers::store_endpoint),
        )
        .route(
            "/services/:name/endpoints/edit",
            get(handlers::edit_endpoint).post(handlers::update_endpoint),
        )
        .route(
            "/services/:name/endpoints/delete",
            get(handlers::delete_endpoint).post(handlers::destroy_endpoint),
        )
        .route(
            "/settings",
            get(handlers::show_settings).post(handlers::update_settings),
        )
}

/// JSON routes nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}
