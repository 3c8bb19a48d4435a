use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Movie, Rating, WatchlistEntry},
};

/// Persistence for cached movie metadata
///
/// Implementations must enforce uniqueness of `external_id`: a second insert
/// for the same id fails with `AppError::AlreadyExists`.
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Movie>>;

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>>;

    async fn insert(&self, movie: &Movie) -> AppResult<()>;

    /// Movies whose genre field contains `genre` (case-insensitive), minus
    /// `exclude`, best rated first.
    async fn top_rated_in_genre(
        &self,
        genre: &str,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Movie>>;

    /// Every movie minus `exclude`, best rated first.
    async fn top_rated(&self, exclude: &HashSet<Uuid>, limit: usize) -> AppResult<Vec<Movie>>;
}

/// User ratings, one per (user, movie)
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Records a new rating; fails with `AppError::AlreadyExists` when the
    /// user already rated the movie.
    async fn rate(&self, user_id: Uuid, movie_id: Uuid, rating: i16) -> AppResult<Rating>;

    /// Changes an existing rating; `None` when there is nothing to change
    async fn update_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i16,
    ) -> AppResult<Option<Rating>>;

    /// Every rating of `user_id`, oldest first
    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>>;

    /// Ratings of `user_id` with value >= `min_rating`, oldest first
    async fn ratings_at_least(&self, user_id: Uuid, min_rating: i16) -> AppResult<Vec<Rating>>;

    async fn rated_movie_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

/// User watchlists, one entry per (user, movie)
#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Fails with `AppError::AlreadyExists` when the movie is already listed
    async fn add_to_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<WatchlistEntry>;

    /// Returns whether an entry was removed
    async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<bool>;

    /// Entries of `user_id`, oldest first
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>>;

    async fn watchlist_movie_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}
