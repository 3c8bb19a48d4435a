use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::Semaphore,
    task::{JoinHandle, JoinSet},
};
use uuid::Uuid;

use crate::{
    db::MovieStore,
    error::{AppError, AppResult},
    models::{canonical_external_id, Movie, SearchResult},
    services::providers::CatalogClient,
};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PRECACHE_CONCURRENCY: usize = 4;

/// Outcome counts of one background pre-cache run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecacheSummary {
    pub cached: usize,
    pub already_cached: usize,
    pub failed: usize,
}

/// Single source of truth for movie metadata
///
/// Reads are cache-aside over the local store; misses go to the external
/// catalog once and the validated record is admitted permanently. Metadata is
/// immutable, so nothing here expires or invalidates. Catalog ids are keyed
/// in their canonical form (see [`canonical_external_id`]).
#[derive(Clone)]
pub struct MovieCache {
    store: Arc<dyn MovieStore>,
    catalog: Arc<dyn CatalogClient>,
    upstream_timeout: Duration,
    /// Shared by every clone, so concurrent searches draw from one pool
    precache_permits: Arc<Semaphore>,
}

impl MovieCache {
    pub fn new(store: Arc<dyn MovieStore>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self {
            store,
            catalog,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            precache_permits: Arc::new(Semaphore::new(DEFAULT_PRECACHE_CONCURRENCY)),
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_precache_concurrency(mut self, workers: usize) -> Self {
        self.precache_permits = Arc::new(Semaphore::new(workers.max(1)));
        self
    }

    /// Local lookup by catalog id; never calls the catalog
    pub async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Movie>> {
        self.store
            .find_by_external_id(&canonical_external_id(external_id))
            .await
    }

    /// Local lookup by local id; never calls the catalog
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Movie>> {
        self.store.find_by_id(id).await
    }

    /// Returns the cached movie, fetching and admitting it on a miss
    pub async fn get_or_create_by_external_id(&self, external_id: &str) -> AppResult<Movie> {
        let external_id = canonical_external_id(external_id);
        let external_id = external_id.as_str();
        if external_id.is_empty() {
            return Err(AppError::InvalidQuery(
                "External id cannot be empty".to_string(),
            ));
        }

        if let Some(movie) = self.store.find_by_external_id(external_id).await? {
            tracing::debug!(external_id = %external_id, "Cache hit");
            return Ok(movie);
        }

        tracing::debug!(external_id = %external_id, "Cache miss");

        let detail = self
            .with_timeout(self.catalog.fetch_detail(external_id))
            .await?;

        if let Some(field) = detail.missing_required_field() {
            tracing::warn!(
                external_id = %external_id,
                field = field,
                provider = self.catalog.name(),
                "Rejected catalog record"
            );
            return Err(AppError::InvalidUpstreamData(format!(
                "catalog record for {} is missing {}",
                external_id, field
            )));
        }

        let returned_id = canonical_external_id(&detail.external_id);
        if returned_id != external_id {
            tracing::warn!(
                external_id = %external_id,
                returned_id = %returned_id,
                provider = self.catalog.name(),
                "Catalog answered with a different title"
            );
            return Err(AppError::InvalidUpstreamData(format!(
                "catalog returned {} for {}",
                returned_id, external_id
            )));
        }

        let movie = Movie::from_detail(&detail);

        match self.store.insert(&movie).await {
            Ok(()) => {
                tracing::info!(
                    external_id = %movie.external_id,
                    movie_id = %movie.id,
                    "Movie cached"
                );
                Ok(movie)
            }
            // Lost a race with a concurrent writer: the row is there now
            Err(AppError::AlreadyExists(_)) => {
                tracing::debug!(
                    external_id = %movie.external_id,
                    "Concurrent insert won, reading existing record"
                );
                self.store
                    .find_by_external_id(&movie.external_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Storage(format!(
                            "movie {} reported as existing but not found",
                            movie.external_id
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Searches the catalog and pre-caches the hits in the background
    pub async fn search(&self, query: &str) -> AppResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidQuery(
                "Search query cannot be empty".to_string(),
            ));
        }

        let results = self.with_timeout(self.catalog.search(query)).await?;

        let ids: Vec<String> = results
            .iter()
            .map(|r| r.external_id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if !ids.is_empty() {
            // Detached: the response does not wait for, or cancel, the pre-cache
            drop(self.precache(ids));
        }

        Ok(results)
    }

    /// Fetches and admits every id not yet cached, on a background task
    ///
    /// The pre-cache concurrency bounds catalog calls across every run in
    /// flight, not per run. Per-item failures are logged and counted, never
    /// propagated.
    pub fn precache(&self, external_ids: Vec<String>) -> JoinHandle<PrecacheSummary> {
        let cache = self.clone();

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();

            for external_id in external_ids {
                let cache = cache.clone();
                tasks.spawn(async move {
                    let _permit = cache.precache_permits.clone().acquire_owned().await;
                    let outcome = cache.precache_one(&external_id).await;
                    (external_id, outcome)
                });
            }

            let mut summary = PrecacheSummary::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(true))) => summary.cached += 1,
                    Ok((_, Ok(false))) => summary.already_cached += 1,
                    Ok((external_id, Err(e))) => {
                        summary.failed += 1;
                        tracing::warn!(
                            external_id = %external_id,
                            error = %e,
                            "Pre-cache failed for search result"
                        );
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(error = %e, "Pre-cache task join error");
                    }
                }
            }

            tracing::info!(
                cached = summary.cached,
                already_cached = summary.already_cached,
                failed = summary.failed,
                "Search pre-cache finished"
            );

            summary
        })
    }

    /// Returns whether a new record was admitted
    async fn precache_one(&self, external_id: &str) -> AppResult<bool> {
        if self.find_by_external_id(external_id).await?.is_some() {
            return Ok(false);
        }
        self.get_or_create_by_external_id(external_id).await?;
        Ok(true)
    }

    async fn with_timeout<T, F>(&self, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    provider = self.catalog.name(),
                    timeout_ms = self.upstream_timeout.as_millis() as u64,
                    "Catalog call timed out"
                );
                Err(AppError::UpstreamUnavailable(format!(
                    "{} did not answer within {:?}",
                    self.catalog.name(),
                    self.upstream_timeout
                )))
            }
        }
    }
}
