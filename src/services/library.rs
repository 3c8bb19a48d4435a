use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{RatingStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{Rating, WatchlistEntry},
    services::movie_cache::MovieCache,
};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// A user's ratings and watchlist, the signal the recommendation engine reads
///
/// Only movies already in the cache can be rated or listed.
#[derive(Clone)]
pub struct UserLibrary {
    ratings: Arc<dyn RatingStore>,
    watchlist: Arc<dyn WatchlistStore>,
    movies: MovieCache,
}

impl UserLibrary {
    pub fn new(
        ratings: Arc<dyn RatingStore>,
        watchlist: Arc<dyn WatchlistStore>,
        movies: MovieCache,
    ) -> Self {
        Self {
            ratings,
            watchlist,
            movies,
        }
    }

    /// Records a first rating; a second one for the same movie is a conflict
    pub async fn rate_movie(&self, user_id: Uuid, movie_id: Uuid, rating: i16) -> AppResult<Rating> {
        check_rating(rating)?;
        self.ensure_cached(movie_id).await?;

        let rating = self
            .ratings
            .rate(user_id, movie_id, rating)
            .await
            .map_err(|e| match e {
                AppError::AlreadyExists(_) => AppError::AlreadyExists(
                    "Movie already rated, update the existing rating instead".to_string(),
                ),
                other => other,
            })?;

        tracing::info!(
            user_id = %user_id,
            movie_id = %movie_id,
            rating = rating.rating,
            "Movie rated"
        );

        Ok(rating)
    }

    pub async fn update_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i16,
    ) -> AppResult<Rating> {
        check_rating(rating)?;

        let rating = self
            .ratings
            .update_rating(user_id, movie_id, rating)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No rating of movie {} to update", movie_id))
            })?;

        tracing::info!(
            user_id = %user_id,
            movie_id = %movie_id,
            rating = rating.rating,
            "Rating updated"
        );

        Ok(rating)
    }

    pub async fn ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        self.ratings.list_ratings(user_id).await
    }

    pub async fn add_to_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<WatchlistEntry> {
        self.ensure_cached(movie_id).await?;

        let entry = self
            .watchlist
            .add_to_watchlist(user_id, movie_id)
            .await
            .map_err(|e| match e {
                AppError::AlreadyExists(_) => {
                    AppError::AlreadyExists("Movie already in watchlist".to_string())
                }
                other => other,
            })?;

        tracing::info!(user_id = %user_id, movie_id = %movie_id, "Added to watchlist");

        Ok(entry)
    }

    pub async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<()> {
        if !self.watchlist.remove_from_watchlist(user_id, movie_id).await? {
            return Err(AppError::NotFound(format!(
                "Movie {} is not in the watchlist",
                movie_id
            )));
        }

        tracing::info!(user_id = %user_id, movie_id = %movie_id, "Removed from watchlist");
        Ok(())
    }

    pub async fn watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        self.watchlist.list_watchlist(user_id).await
    }

    async fn ensure_cached(&self, movie_id: Uuid) -> AppResult<()> {
        match self.movies.find_by_id(movie_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Movie {} not found", movie_id))),
        }
    }
}

fn check_rating(rating: i16) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::InvalidRating(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )));
    }
    Ok(())
}

/// Five-star rendering of a rating, e.g. 3 -> "★★★☆☆"
pub fn star_display(rating: i16) -> String {
    (MIN_RATING..=MAX_RATING)
        .map(|i| if i <= rating { '★' } else { '☆' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{MemoryStore, MovieStore},
        models::test_movie,
        services::providers::MockCatalogClient,
    };
    use tokio_test::assert_ok;

    async fn library_with_movie() -> (UserLibrary, Uuid) {
        let store = MemoryStore::new();
        let movie = test_movie("tt0133093", "Action, Sci-Fi", "8.7");
        store.insert(&movie).await.unwrap();

        let cache = MovieCache::new(Arc::new(store.clone()), Arc::new(MockCatalogClient::new()));
        let library = UserLibrary::new(Arc::new(store.clone()), Arc::new(store), cache);
        (library, movie.id)
    }

    #[test]
    fn test_star_display() {
        assert_eq!(star_display(1), "★☆☆☆☆");
        assert_eq!(star_display(4), "★★★★☆");
        assert_eq!(star_display(5), "★★★★★");
    }

    #[tokio::test]
    async fn test_rating_out_of_range_is_rejected() {
        let (library, movie_id) = library_with_movie().await;
        let user = Uuid::new_v4();

        for bad in [0, 6, -3] {
            let err = library.rate_movie(user, movie_id, bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidRating(_)));
        }
        assert!(library.ratings(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_rating_conflicts_and_update_replaces() {
        let (library, movie_id) = library_with_movie().await;
        let user = Uuid::new_v4();

        assert_ok!(library.rate_movie(user, movie_id, 3).await);
        let err = library.rate_movie(user, movie_id, 4).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        let updated = library.update_rating(user, movie_id, 5).await.unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(library.ratings(user).await.unwrap()[0].rating, 5);
    }

    #[tokio::test]
    async fn test_update_without_rating_is_not_found() {
        let (library, movie_id) = library_with_movie().await;

        let err = library
            .update_rating(Uuid::new_v4(), movie_id, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_movie_cannot_be_rated_or_listed() {
        let (library, _) = library_with_movie().await;
        let user = Uuid::new_v4();

        let err = library.rate_movie(user, Uuid::new_v4(), 4).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = library
            .add_to_watchlist(user, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_watchlist_add_conflict_and_remove() {
        let (library, movie_id) = library_with_movie().await;
        let user = Uuid::new_v4();

        assert_ok!(library.add_to_watchlist(user, movie_id).await);
        let err = library.add_to_watchlist(user, movie_id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        assert_ok!(library.remove_from_watchlist(user, movie_id).await);
        let err = library
            .remove_from_watchlist(user, movie_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(library.watchlist(user).await.unwrap().is_empty());
    }
}
