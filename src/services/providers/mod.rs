/// External movie catalog abstraction
///
/// The cache talks to the catalog only through this trait, so tests can swap
/// in a fake and a different provider can replace OMDb without touching the
/// cache or the recommendation engine.
use crate::{
    error::AppResult,
    models::{CatalogDetail, SearchResult},
};

pub mod omdb;

pub use omdb::OmdbClient;

/// Trait for external catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fuzzy title search
    ///
    /// A provider answer of "no results" is an empty list, not an error.
    async fn search(&self, title: &str) -> AppResult<Vec<SearchResult>>;

    /// Exact lookup by catalog id
    ///
    /// Fails with `AppError::NotFound` when the provider has no such title.
    async fn fetch_detail(&self, external_id: &str) -> AppResult<CatalogDetail>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
