use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, PosterResult},
    routes::AppState,
};

/// Upper bound on ids per batch request
const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub ids: Vec<MovieId>,
}

/// Handler resolving the poster of a single movie
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<PosterResult> {
    let id = MovieId(id);
    let poster_url = state.poster_resolver.resolve_poster(id).await;
    Json(PosterResult { id, poster_url })
}

/// Handler resolving posters for several movies, answered in request order
pub async fn resolve_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> AppResult<Json<Vec<PosterResult>>> {
    if request.ids.len() > MAX_BATCH_SIZE {
        return Err(AppError::InvalidInput(format!(
            "At most {} ids per batch",
            MAX_BATCH_SIZE
        )));
    }

    let results = state
        .poster_resolver
        .resolve_batch(request.ids, state.poster_workers)
        .await;

    Ok(Json(results))
}
