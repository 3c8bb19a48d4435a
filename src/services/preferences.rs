use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{db::RatingStore, error::AppResult, services::movie_cache::MovieCache};

/// Star rating at or above which a rating counts as "liked"
pub const LIKED_RATING_THRESHOLD: i16 = 4;

/// Derives a ranked genre list from a user's rating history
#[derive(Clone)]
pub struct PreferenceAnalyzer {
    ratings: Arc<dyn RatingStore>,
    movies: MovieCache,
}

impl PreferenceAnalyzer {
    pub fn new(ratings: Arc<dyn RatingStore>, movies: MovieCache) -> Self {
        Self { ratings, movies }
    }

    /// Genres of the movies `user_id` rated at least `min_rating`, most
    /// frequent first. Equal counts keep the order in which the genres were
    /// first seen while walking the ratings.
    ///
    /// A user without qualifying ratings gets an empty list.
    pub async fn compute_preferred_genres(
        &self,
        user_id: Uuid,
        min_rating: i16,
    ) -> AppResult<Vec<String>> {
        let ratings = self.ratings.ratings_at_least(user_id, min_rating).await?;

        let mut genres = Vec::new();
        for rating in &ratings {
            match self.movies.find_by_id(rating.movie_id).await? {
                Some(movie) => genres.push(movie.genre),
                None => tracing::debug!(
                    user_id = %user_id,
                    movie_id = %rating.movie_id,
                    "Rated movie missing from cache, skipping"
                ),
            }
        }

        let preferred = rank_genres(genres.iter().map(String::as_str));

        tracing::debug!(
            user_id = %user_id,
            liked = ratings.len(),
            genres = ?preferred,
            "Computed preferred genres"
        );

        Ok(preferred)
    }
}

/// Counts genre tokens across genre fields and orders them by descending
/// count, ties in first-seen order.
pub fn rank_genres<'a, I>(genre_fields: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for field in genre_fields {
        for token in crate::models::genre_tokens(field) {
            match index.get(token) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(token.to_string(), counts.len());
                    counts.push((token.to_string(), 1));
                }
            }
        }
    }

    // sort_by is stable, so first-seen order survives among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(genre, _)| genre).collect()
}
