use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::PosterResolver,
    store::DataState,
};

pub mod movies;
pub mod posters;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    /// Catalog and similarity matrix, or why they could not be loaded
    pub data: DataState,
    /// Poster source for recommendation results
    pub poster_resolver: Arc<dyn PosterResolver>,
    /// Concurrent poster lookups per batch
    pub poster_workers: usize,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list))
        .route("/movies/:title", get(movies::lookup))
        .route("/recommendations", get(recommendations::recommend))
        .route("/posters/batch", post(posters::resolve_batch))
        .route("/posters/:id", get(posters::resolve))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let data = if state.data.is_ready() {
        "ready"
    } else {
        "unavailable"
    };

    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "data": data })),
    )
}
