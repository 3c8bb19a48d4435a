use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::Movie,
    routes::AppState,
    services::recommendations::DEFAULT_LIMIT,
};

const ALGORITHM: &str = "rule-based";
const CRITERIA: &str = "Genres rated 4+ stars, excluding rated and watchlist movies";

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Movie>,
    pub count: usize,
    pub limit: i64,
    pub algorithm: &'static str,
    pub criteria: &'static str,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit = limit,
        "Processing recommendation request"
    );

    let recommendations = state
        .recommendations
        .get_recommendations(user_id, limit)
        .await?;

    Ok(Json(RecommendationResponse {
        count: recommendations.len(),
        recommendations,
        limit,
        algorithm: ALGORITHM,
        criteria: CRITERIA,
    }))
}
