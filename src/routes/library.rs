use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Rating, WatchlistEntry},
    routes::AppState,
    services::library::star_display,
};

#[derive(Debug, Deserialize)]
pub struct RateMovieRequest {
    pub movie_id: Uuid,
    pub rating: i16,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: i16,
}

#[derive(Debug, Deserialize)]
pub struct AddToWatchlistRequest {
    pub movie_id: Uuid,
}

/// A rating plus its star rendering
#[derive(Debug, Serialize)]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub stars: String,
}

impl From<Rating> for RatingView {
    fn from(rating: Rating) -> Self {
        let stars = star_display(rating.rating);
        Self { rating, stars }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingsResponse {
    pub ratings: Vec<RatingView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub watchlist: Vec<WatchlistEntry>,
    pub count: usize,
}

/// Handler for a first rating of a movie
pub async fn rate_movie(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<RateMovieRequest>,
) -> AppResult<(StatusCode, Json<RatingView>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        movie_id = %request.movie_id,
        "Processing rating"
    );

    let rating = state
        .library
        .rate_movie(user_id, request.movie_id, request.rating)
        .await?;
    Ok((StatusCode::CREATED, Json(rating.into())))
}

/// Handler for changing an existing rating
pub async fn update_rating(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateRatingRequest>,
) -> AppResult<Json<RatingView>> {
    let rating = state
        .library
        .update_rating(user_id, movie_id, request.rating)
        .await?;
    Ok(Json(rating.into()))
}

pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<RatingsResponse>> {
    let ratings: Vec<RatingView> = state
        .library
        .ratings(user_id)
        .await?
        .into_iter()
        .map(RatingView::from)
        .collect();

    Ok(Json(RatingsResponse {
        count: ratings.len(),
        ratings,
    }))
}

pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AddToWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistEntry>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        movie_id = %request.movie_id,
        "Processing watchlist add"
    );

    let entry = state
        .library
        .add_to_watchlist(user_id, request.movie_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .library
        .remove_from_watchlist(user_id, movie_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_watchlist(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<WatchlistResponse>> {
    let watchlist = state.library.watchlist(user_id).await?;

    Ok(Json(WatchlistResponse {
        count: watchlist.len(),
        watchlist,
    }))
}
