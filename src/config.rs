use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. Without it the service keeps
    /// everything in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL, used for metering upstream catalog calls
    #[serde(default)]
    pub redis_url: Option<String>,

    /// OMDb API key
    #[serde(default)]
    pub omdb_api_key: String,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Per-call timeout for catalog lookups
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Worker count for the search pre-cache
    #[serde(default = "default_precache_concurrency")]
    pub precache_concurrency: usize,

    /// Catalog calls allowed per UTC day when Redis metering is enabled
    #[serde(default = "default_daily_upstream_quota")]
    pub daily_upstream_quota: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_precache_concurrency() -> usize {
    4
}

fn default_daily_upstream_quota() -> u32 {
    1_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the service cannot start with.
    ///
    /// A missing catalog key is fatal here rather than on the first request.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.omdb_api_key.trim().is_empty() {
            anyhow::bail!("OMDB_API_KEY is not configured");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be positive");
        }
        if self.precache_concurrency == 0 {
            anyhow::bail!("PRECACHE_CONCURRENCY must be positive");
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: Vec<(&str, &str)>) -> Result<Config, envy::Error> {
        envy::from_iter(
            vars.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_defaults() {
        let config = config_from(vec![("OMDB_API_KEY", "abc123")]).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.omdb_api_url, "http://www.omdbapi.com");
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
        assert_eq!(config.precache_concurrency, 4);
        assert_eq!(config.daily_upstream_quota, 1_000);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let config = config_from(vec![("PORT", "9000")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(vec![("OMDB_API_KEY", "   ")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(vec![
            ("OMDB_API_KEY", "k"),
            ("DATABASE_URL", "postgres://localhost/marquee"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("PRECACHE_CONCURRENCY", "2"),
        ])
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/marquee")
        );
        assert_eq!(config.upstream_timeout(), Duration::from_secs(5));
        assert_eq!(config.precache_concurrency, 2);
    }
}
