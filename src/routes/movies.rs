use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Movie, SearchResult},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movies: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalIdQuery {
    #[serde(default)]
    external_id: String,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie: Movie,
}

/// Handler for catalog search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!(request_id = %request_id, query = %params.q, "Processing movie search");

    let movies = state.movies.search(&params.q).await?;
    Ok(Json(SearchResponse { movies }))
}

/// Handler for cached movie lookup by local id
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MovieResponse>> {
    let movie = state
        .movies
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))?;

    Ok(Json(MovieResponse { movie }))
}

/// Handler for get-or-create by catalog id
pub async fn by_external_id(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ExternalIdQuery>,
) -> AppResult<Json<Movie>> {
    tracing::info!(
        request_id = %request_id,
        external_id = %params.external_id,
        "Processing movie lookup"
    );

    let movie = state
        .movies
        .get_or_create_by_external_id(&params.external_id)
        .await?;
    Ok(Json(movie))
}
