/// OMDb catalog provider
///
/// API Flow:
/// 1. Title Search: `/?s={title}` returns lightweight hits without genre
/// 2. Details: `/?i={imdb_id}` returns the full record
///
/// OMDb answers HTTP 200 for most failures and signals them with
/// `"Response": "False"` plus an `Error` message.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    db::UsageMeter,
    error::{AppError, AppResult},
    models::{CatalogDetail, OmdbSearchResponse, OmdbTitle, SearchResult},
    services::providers::CatalogClient,
};

#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    usage: Option<UsageMeter>,
}

impl OmdbClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            usage: None,
        })
    }

    /// Meters every outgoing call against a daily quota
    pub fn with_usage_meter(mut self, usage: UsageMeter) -> Self {
        self.usage = Some(usage);
        self
    }

    async fn check_quota(&self) -> AppResult<()> {
        if let Some(usage) = &self.usage {
            match usage.check_quota().await {
                // Metering is best effort; a Redis outage must not block lookups
                Err(AppError::Cache(e)) => {
                    tracing::warn!(error = %e, "Usage meter unavailable, skipping quota check")
                }
                other => other?,
            }
        }
        Ok(())
    }

    async fn record_call(&self) {
        if let Some(usage) = &self.usage {
            if let Err(e) = usage.record_call().await {
                tracing::warn!(error = %e, "Failed to record catalog usage");
            }
        }
    }

    /// Sends one GET to the OMDb root with the given query parameters
    async fn get(&self, params: &[(&str, &str)]) -> AppResult<reqwest::Response> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "OMDb API key not configured".to_string(),
            ));
        }

        self.check_quota().await?;

        let url = format!("{}/", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        self.record_call().await;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "omdb",
                "Catalog request failed"
            );
            return Err(AppError::UpstreamUnavailable(format!(
                "OMDb returned status {}",
                status
            )));
        }

        Ok(response)
    }
}

/// True when an OMDb error message means the title does not exist
fn is_missing_title(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("not found") || message.contains("incorrect imdb id")
}

/// Maps an OMDb `"Response": "False"` payload to an error kind
fn upstream_failure(error: Option<String>) -> AppError {
    let message = error.unwrap_or_else(|| "OMDb returned an error response".to_string());
    let lowered = message.to_lowercase();

    if is_missing_title(&message) {
        AppError::NotFound(message)
    } else if lowered.contains("api key") {
        AppError::Configuration(message)
    } else {
        AppError::UpstreamError(message)
    }
}

fn is_success(response: &str) -> bool {
    response.eq_ignore_ascii_case("true")
}

fn convert_search_response(body: OmdbSearchResponse) -> AppResult<Vec<SearchResult>> {
    if !is_success(&body.response) {
        return match upstream_failure(body.error) {
            // Zero hits is an empty result set
            AppError::NotFound(_) => Ok(vec![]),
            err => Err(err),
        };
    }

    Ok(body.search.into_iter().map(SearchResult::from).collect())
}

fn convert_detail_response(body: OmdbTitle) -> AppResult<CatalogDetail> {
    if !is_success(&body.response) {
        return Err(upstream_failure(body.error));
    }

    Ok(CatalogDetail::from(body))
}

#[async_trait::async_trait]
impl CatalogClient for OmdbClient {
    async fn search(&self, title: &str) -> AppResult<Vec<SearchResult>> {
        let response = self.get(&[("s", title), ("type", "movie")]).await?;
        let body: OmdbSearchResponse = response.json().await?;
        let results = convert_search_response(body)?;

        tracing::info!(
            query = %title,
            results = results.len(),
            provider = self.name(),
            "Title search completed"
        );

        Ok(results)
    }

    async fn fetch_detail(&self, external_id: &str) -> AppResult<CatalogDetail> {
        let response = self.get(&[("i", external_id), ("plot", "short")]).await?;
        let body: OmdbTitle = response.json().await?;
        let detail = convert_detail_response(body)?;

        tracing::info!(
            external_id = %external_id,
            provider = self.name(),
            "Title details fetched"
        );

        Ok(detail)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
