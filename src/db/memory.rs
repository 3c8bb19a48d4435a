use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::store::{MovieStore, RatingStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{by_rating_desc, Movie, Rating, WatchlistEntry},
};

/// In-process store with the same uniqueness rules as the Postgres schema
///
/// Used when no `DATABASE_URL` is configured, and throughout the tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    movies: Vec<Movie>,
    ratings: Vec<Rating>,
    watchlist: Vec<WatchlistEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn movie_count(&self) -> usize {
        self.inner.read().await.movies.len()
    }

    async fn ranked<F>(&self, exclude: &HashSet<Uuid>, limit: usize, keep: F) -> Vec<Movie>
    where
        F: Fn(&Movie) -> bool,
    {
        let inner = self.inner.read().await;
        let mut movies: Vec<Movie> = inner
            .movies
            .iter()
            .filter(|m| !exclude.contains(&m.id) && keep(m))
            .cloned()
            .collect();
        movies.sort_by(by_rating_desc);
        movies.truncate(limit);
        movies
    }
}

/// Same bound as the `ratings.rating` CHECK constraint
fn check_rating_range(rating: i16) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Storage(format!(
            "rating {} violates the 1-5 range",
            rating
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl MovieStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .iter()
            .find(|m| m.external_id == external_id)
            .cloned())
    }

    async fn insert(&self, movie: &Movie) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner
            .movies
            .iter()
            .any(|m| m.external_id == movie.external_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "movie with external id {}",
                movie.external_id
            )));
        }
        inner.movies.push(movie.clone());
        Ok(())
    }

    async fn top_rated_in_genre(
        &self,
        genre: &str,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        Ok(self
            .ranked(exclude, limit, |m| m.matches_genre(genre))
            .await)
    }

    async fn top_rated(&self, exclude: &HashSet<Uuid>, limit: usize) -> AppResult<Vec<Movie>> {
        Ok(self.ranked(exclude, limit, |_| true).await)
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn rate(&self, user_id: Uuid, movie_id: Uuid, rating: i16) -> AppResult<Rating> {
        check_rating_range(rating)?;

        let mut inner = self.inner.write().await;
        if inner
            .ratings
            .iter()
            .any(|r| r.user_id == user_id && r.movie_id == movie_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "rating for user {} and movie {}",
                user_id, movie_id
            )));
        }

        let now = Utc::now();
        let rating = Rating {
            user_id,
            movie_id,
            rating,
            created_at: now,
            updated_at: now,
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn update_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i16,
    ) -> AppResult<Option<Rating>> {
        check_rating_range(rating)?;

        let mut inner = self.inner.write().await;
        Ok(inner
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .map(|existing| {
                existing.rating = rating;
                existing.updated_at = Utc::now();
                existing.clone()
            }))
    }

    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn ratings_at_least(&self, user_id: Uuid, min_rating: i16) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id && r.rating >= min_rating)
            .cloned()
            .collect())
    }

    async fn rated_movie_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.movie_id)
            .collect())
    }
}

#[async_trait::async_trait]
impl WatchlistStore for MemoryStore {
    async fn add_to_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<WatchlistEntry> {
        let mut inner = self.inner.write().await;
        if inner
            .watchlist
            .iter()
            .any(|w| w.user_id == user_id && w.movie_id == movie_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "watchlist entry for user {} and movie {}",
                user_id, movie_id
            )));
        }

        let entry = WatchlistEntry {
            user_id,
            movie_id,
            added_at: Utc::now(),
        };
        inner.watchlist.push(entry.clone());
        Ok(entry)
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.watchlist.len();
        inner
            .watchlist
            .retain(|w| !(w.user_id == user_id && w.movie_id == movie_id));
        Ok(inner.watchlist.len() < before)
    }

    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .watchlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn watchlist_movie_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .watchlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.movie_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_movie;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_insert_rejects_duplicate_external_id() {
        let store = MemoryStore::new();
        assert_ok!(store.insert(&test_movie("tt1", "Drama", "7.0")).await);

        let err = store
            .insert(&test_movie("tt1", "Comedy", "5.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
        assert_eq!(store.movie_count().await, 1);
    }

    #[tokio::test]
    async fn test_top_rated_in_genre_filters_excludes_and_orders() {
        let store = MemoryStore::new();
        let low = test_movie("tt1", "Action, Sci-Fi", "7.1");
        let high = test_movie("tt2", "action", "8.8");
        let excluded = test_movie("tt3", "Action", "9.9");
        let other = test_movie("tt4", "Drama", "9.0");
        for m in [&low, &high, &excluded, &other] {
            store.insert(m).await.unwrap();
        }

        let exclude: HashSet<Uuid> = [excluded.id].into_iter().collect();
        let found = store
            .top_rated_in_genre("ACTION", &exclude, 10)
            .await
            .unwrap();

        let ids: Vec<Uuid> = found.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);
    }

    #[tokio::test]
    async fn test_top_rated_respects_limit() {
        let store = MemoryStore::new();
        for (id, rating) in [("tt1", "6.0"), ("tt2", "N/A"), ("tt3", "9.0")] {
            store.insert(&test_movie(id, "Drama", rating)).await.unwrap();
        }

        let found = store.top_rated(&HashSet::new(), 2).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|m| m.external_id.as_str()).collect();
        assert_eq!(ids, vec!["tt3", "tt1"]);
    }

    #[tokio::test]
    async fn test_ratings_are_unique_per_user_and_movie() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let movie = Uuid::new_v4();

        assert_ok!(store.rate(user, movie, 5).await);
        assert_err!(store.rate(user, movie, 3).await);
        assert_err!(store.rate(user, Uuid::new_v4(), 6).await);

        let liked = store.ratings_at_least(user, 4).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(store.rated_movie_ids(user).await.unwrap(), vec![movie]);
    }

    #[tokio::test]
    async fn test_update_rating_changes_only_existing_rows() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let movie = Uuid::new_v4();

        assert_eq!(store.update_rating(user, movie, 4).await.unwrap(), None);

        let created = store.rate(user, movie, 2).await.unwrap();
        let updated = store.update_rating(user, movie, 5).await.unwrap().unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.created_at, created.created_at);
        assert_err!(store.update_rating(user, movie, 0).await);

        let listed = store.list_ratings(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rating, 5);
    }

    #[tokio::test]
    async fn test_remove_from_watchlist() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.add_to_watchlist(user, a).await.unwrap();
        store.add_to_watchlist(user, b).await.unwrap();

        assert!(store.remove_from_watchlist(user, a).await.unwrap());
        assert!(!store.remove_from_watchlist(user, a).await.unwrap());

        let listed: Vec<Uuid> = store
            .list_watchlist(user)
            .await
            .unwrap()
            .iter()
            .map(|w| w.movie_id)
            .collect();
        assert_eq!(listed, vec![b]);
    }

    #[tokio::test]
    async fn test_watchlist_is_scoped_to_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let movie = Uuid::new_v4();

        store.add_to_watchlist(alice, movie).await.unwrap();
        assert_err!(store.add_to_watchlist(alice, movie).await);

        assert_eq!(store.watchlist_movie_ids(alice).await.unwrap(), vec![movie]);
        assert!(store.watchlist_movie_ids(bob).await.unwrap().is_empty());
    }
}
