use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::CatalogEntry,
    routes::AppState,
};

/// Handler listing every catalog title, in catalog order
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    let store = state.data.store()?;
    let titles = store.titles().into_iter().map(str::to_string).collect();
    Ok(Json(titles))
}

/// Handler for looking up one movie by exact title
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> AppResult<Json<CatalogEntry>> {
    let store = state.data.store()?;
    store
        .find(&title)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie '{}' not in catalog", title)))
}
