use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A movie admitted into the local cache
///
/// Metadata is immutable once stored: the cache never updates or deletes rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: Uuid,
    /// Catalog identifier (IMDb id for OMDb), unique across the store
    pub external_id: String,
    pub title: String,
    pub year: String,
    /// Comma-delimited free text, e.g. "Action, Sci-Fi"
    pub genre: String,
    pub director: String,
    pub plot: String,
    pub poster_url: String,
    pub runtime: String,
    /// Text-encoded decimal, "N/A" when the catalog has no rating
    pub rating: String,
    pub cached_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// Builds a new cache record from a validated catalog detail
    pub fn from_detail(detail: &CatalogDetail) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: canonical_external_id(&detail.external_id),
            title: detail.title.trim().to_string(),
            year: detail.year.trim().to_string(),
            genre: detail.genre.trim().to_string(),
            director: detail.director.trim().to_string(),
            plot: detail.plot.trim().to_string(),
            poster_url: detail.poster_url.trim().to_string(),
            runtime: detail.runtime.trim().to_string(),
            rating: detail.rating.trim().to_string(),
            cached_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Numeric value of the rating field
    ///
    /// Only plain decimals count: an optional sign, digits and at most one
    /// point, no exponent, at most [`MAX_RATING_LEN`] characters. The Postgres
    /// store applies the same grammar in SQL.
    pub fn rating_value(&self) -> Option<f64> {
        let text = self.rating.trim();
        if text.len() > MAX_RATING_LEN {
            return None;
        }

        let unsigned = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
        let digits = unsigned.bytes().filter(u8::is_ascii_digit).count();
        let points = unsigned.bytes().filter(|b| *b == b'.').count();
        if digits == 0 || points > 1 || digits + points != unsigned.len() {
            return None;
        }

        text.parse::<f64>().ok()
    }

    /// Case-insensitive substring match of a genre name against the genre field
    pub fn matches_genre(&self, genre: &str) -> bool {
        self.genre.to_lowercase().contains(&genre.to_lowercase())
    }
}

/// Longest rating text treated as numeric
pub const MAX_RATING_LEN: usize = 32;

/// Cache key form of a catalog id: trimmed, ASCII lowercase
///
/// IMDb ids are case-insensitive, and OMDb answers with the lowercase form.
pub fn canonical_external_id(external_id: &str) -> String {
    external_id.trim().to_ascii_lowercase()
}

/// Splits a genre field on commas, trims each token and drops empty ones.
pub fn genre_tokens(genre: &str) -> Vec<&str> {
    genre
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Candidate ordering shared by every store: descending numeric rating,
/// non-numeric ratings last, then external id ascending.
pub fn by_rating_desc(a: &Movie, b: &Movie) -> Ordering {
    match (a.rating_value(), b.rating_value()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.external_id.cmp(&b.external_id))
}

/// A user's star rating of a movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    /// 1 to 5 stars
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A movie on a user's watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistEntry {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub added_at: DateTime<Utc>,
}

/// Lightweight search hit returned to the client
///
/// Carries no genre, and is never admitted into the movie store as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub external_id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
}

/// Full catalog record for one title, as returned by a detail lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogDetail {
    pub external_id: String,
    pub title: String,
    pub year: String,
    pub genre: String,
    pub director: String,
    pub plot: String,
    pub poster_url: String,
    pub runtime: String,
    pub rating: String,
}

impl CatalogDetail {
    /// Names the first required field that is blank after trimming.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.external_id.trim().is_empty() {
            Some("external id")
        } else if self.title.trim().is_empty() {
            Some("title")
        } else if self.genre.trim().is_empty() {
            Some("genre")
        } else {
            None
        }
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Raw title record from OMDb, shared by search items and detail lookups
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OmdbTitle {
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

/// Raw response from the OMDb `s=` search endpoint
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbTitle>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl From<OmdbTitle> for SearchResult {
    fn from(title: OmdbTitle) -> Self {
        SearchResult {
            external_id: title.imdb_id,
            title: title.title,
            year: title.year,
            poster_url: title.poster,
        }
    }
}

impl From<OmdbTitle> for CatalogDetail {
    fn from(title: OmdbTitle) -> Self {
        CatalogDetail {
            external_id: title.imdb_id,
            title: title.title,
            year: title.year,
            genre: title.genre,
            director: title.director,
            plot: title.plot,
            poster_url: title.poster,
            runtime: title.runtime,
            rating: title.imdb_rating,
        }
    }
}

/// Movie fixture shared by unit tests across modules
#[cfg(test)]
pub(crate) fn test_movie(external_id: &str, genre: &str, rating: &str) -> Movie {
    Movie::from_detail(&CatalogDetail {
        external_id: external_id.to_string(),
        title: format!("Movie {}", external_id),
        genre: genre.to_string(),
        rating: rating.to_string(),
        ..Default::default()
    })
}
