use std::{sync::Arc, time::Duration};

use crate::{
    db::{MovieStore, RatingStore, WatchlistStore},
    services::{
        CatalogClient, ExclusionSetBuilder, MovieCache, PreferenceAnalyzer, RecommendationEngine,
        UserLibrary,
    },
};

/// Shared application state
pub struct AppState {
    pub movies: MovieCache,
    pub library: UserLibrary,
    pub recommendations: RecommendationEngine,
}

impl AppState {
    /// Wires the cache and the recommendation engine over the given collaborators
    pub fn new(
        movie_store: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        watchlist: Arc<dyn WatchlistStore>,
        catalog: Arc<dyn CatalogClient>,
        upstream_timeout: Duration,
        precache_concurrency: usize,
    ) -> Self {
        let movies = MovieCache::new(movie_store.clone(), catalog)
            .with_upstream_timeout(upstream_timeout)
            .with_precache_concurrency(precache_concurrency);

        let library = UserLibrary::new(ratings.clone(), watchlist.clone(), movies.clone());

        let recommendations = RecommendationEngine::new(
            PreferenceAnalyzer::new(ratings.clone(), movies.clone()),
            ExclusionSetBuilder::new(ratings, watchlist),
            movie_store,
        );

        Self {
            movies,
            library,
            recommendations,
        }
    }
}
