use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::Recommendation,
    routes::AppState,
    services::recommendations,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<Recommendation>,
}

/// Handler for recommendations endpoint
///
/// Unknown titles answer with an empty list.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if params.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }

    let store = state.data.store()?;

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        "Processing recommendation request"
    );

    let recommendations = recommendations::recommend_with_posters(
        &params.title,
        &store,
        state.poster_resolver.clone(),
        state.poster_workers,
    )
    .await;

    Ok(Json(RecommendationResponse {
        query: params.title,
        recommendations,
    }))
}
