use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use crate::{
    db::MovieStore,
    error::{AppError, AppResult},
    models::Movie,
    services::{
        exclusions::ExclusionSetBuilder,
        preferences::{PreferenceAnalyzer, LIKED_RATING_THRESHOLD},
    },
};

/// Limit used by the HTTP layer when the caller does not pass one
pub const DEFAULT_LIMIT: i64 = 10;

/// Rule-based recommendations
///
/// Candidates come from the user's liked genres in preference order, each
/// genre best rated first. When those run out before `limit`, the best rated
/// remaining movies fill the rest. Anything the user already rated or
/// watchlisted is never suggested.
#[derive(Clone)]
pub struct RecommendationEngine {
    preferences: PreferenceAnalyzer,
    exclusions: ExclusionSetBuilder,
    movies: Arc<dyn MovieStore>,
}

impl RecommendationEngine {
    pub fn new(
        preferences: PreferenceAnalyzer,
        exclusions: ExclusionSetBuilder,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            preferences,
            exclusions,
            movies,
        }
    }

    /// Up to `limit` movies for `user_id`, in final ranking order
    ///
    /// Too little signal or too few candidates shrink the result, they never
    /// fail it. Any store failure fails the whole call.
    pub async fn get_recommendations(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Movie>> {
        if limit <= 0 {
            return Err(AppError::InvalidLimit(format!(
                "limit must be a positive integer, got {}",
                limit
            )));
        }
        let limit = usize::try_from(limit)
            .map_err(|_| AppError::InvalidLimit(format!("limit {} is too large", limit)))?;

        let preferred = self
            .preferences
            .compute_preferred_genres(user_id, LIKED_RATING_THRESHOLD)
            .await?;
        let exclude = self.exclusions.compute_exclusions(user_id).await?;

        let mut picks = Picks::new(exclude, limit);

        for genre in &preferred {
            if picks.is_full() {
                break;
            }
            let candidates = self
                .movies
                .top_rated_in_genre(genre, &picks.skip, picks.remaining())
                .await?;
            picks.extend(candidates);
        }
        let from_genres = picks.len();

        if !picks.is_full() {
            let candidates = self
                .movies
                .top_rated(&picks.skip, picks.remaining())
                .await?;
            picks.extend(candidates);
        }

        let recommendations = picks.into_movies();

        tracing::info!(
            user_id = %user_id,
            limit = limit,
            preferred_genres = preferred.len(),
            from_genres = from_genres,
            from_fallback = recommendations.len() - from_genres,
            "Recommendations computed"
        );

        Ok(recommendations)
    }
}

/// Ordered selection that refuses excluded or already chosen movies
struct Picks {
    /// Excluded ids plus everything selected so far
    skip: HashSet<Uuid>,
    movies: Vec<Movie>,
    limit: usize,
}

impl Picks {
    fn new(exclude: HashSet<Uuid>, limit: usize) -> Self {
        Self {
            skip: exclude,
            movies: Vec::new(),
            limit,
        }
    }

    fn len(&self) -> usize {
        self.movies.len()
    }

    fn is_full(&self) -> bool {
        self.movies.len() >= self.limit
    }

    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.movies.len())
    }

    fn extend(&mut self, candidates: Vec<Movie>) {
        for movie in candidates {
            if self.is_full() {
                break;
            }
            if self.skip.insert(movie.id) {
                self.movies.push(movie);
            }
        }
    }

    fn into_movies(mut self) -> Vec<Movie> {
        self.movies.truncate(self.limit);
        self.movies
    }
}
