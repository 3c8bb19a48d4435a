pub mod exclusions;
pub mod library;
pub mod movie_cache;
pub mod preferences;
pub mod providers;
pub mod recommendations;

pub use exclusions::ExclusionSetBuilder;
pub use library::UserLibrary;
pub use movie_cache::{MovieCache, PrecacheSummary};
pub use preferences::PreferenceAnalyzer;
pub use providers::{CatalogClient, OmdbClient};
pub use recommendations::RecommendationEngine;
