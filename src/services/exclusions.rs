use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use crate::{
    db::{RatingStore, WatchlistStore},
    error::AppResult,
};

/// Movies a user has already rated (any value) or watchlisted
#[derive(Clone)]
pub struct ExclusionSetBuilder {
    ratings: Arc<dyn RatingStore>,
    watchlist: Arc<dyn WatchlistStore>,
}

impl ExclusionSetBuilder {
    pub fn new(ratings: Arc<dyn RatingStore>, watchlist: Arc<dyn WatchlistStore>) -> Self {
        Self { ratings, watchlist }
    }

    pub async fn compute_exclusions(&self, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let rated = self.ratings.rated_movie_ids(user_id).await?;
        let listed = self.watchlist.watchlist_movie_ids(user_id).await?;

        let exclude: HashSet<Uuid> = rated.into_iter().chain(listed).collect();

        tracing::debug!(user_id = %user_id, excluded = exclude.len(), "Computed exclusions");

        Ok(exclude)
    }
}
