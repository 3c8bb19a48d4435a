use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod library;
pub mod movies;
pub mod recommendations;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost, so the trace span can see the id
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/movies/by-external-id", get(movies::by_external_id))
        .route("/movies/:id", get(movies::get_movie))
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::recommend),
        )
        .route(
            "/users/:user_id/ratings",
            get(library::list_ratings).post(library::rate_movie),
        )
        .route("/users/:user_id/ratings/:movie_id", put(library::update_rating))
        .route(
            "/users/:user_id/watchlist",
            get(library::list_watchlist).post(library::add_to_watchlist),
        )
        .route(
            "/users/:user_id/watchlist/:movie_id",
            delete(library::remove_from_watchlist),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
