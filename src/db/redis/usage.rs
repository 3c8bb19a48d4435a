use chrono::{NaiveDate, Utc};
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppError;
use crate::error::AppResult;

/// Counters outlive their day so late reads still see them
const USAGE_KEY_TTL: i64 = 60 * 60 * 48;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UsageKey {
    /// Catalog calls made on a UTC calendar day
    Daily(NaiveDate),
}

impl Display for UsageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageKey::Daily(day) => write!(f, "catalog_usage:daily:{}", day.format("%Y-%m-%d")),
        }
    }
}

/// Creates a Redis client for usage metering
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Tracks how many catalog calls were spent today against a daily quota
///
/// The external catalog is rate limited per API key; once the quota is spent
/// further calls are refused locally instead of burning upstream errors.
#[derive(Clone)]
pub struct UsageMeter {
    redis_client: Client,
    daily_quota: u32,
}

impl UsageMeter {
    pub fn new(redis_client: Client, daily_quota: u32) -> Self {
        Self {
            redis_client,
            daily_quota,
        }
    }

    fn today() -> UsageKey {
        UsageKey::Daily(Utc::now().date_naive())
    }

    /// Fails with `UpstreamUnavailable` once today's quota is used up
    pub async fn check_quota(&self) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let used: Option<u32> = conn.get(Self::today().to_string()).await?;

        quota_status(used.unwrap_or(0), self.daily_quota)
    }

    /// Counts one catalog call against today's quota
    pub async fn record_call(&self) -> AppResult<u32> {
        let key = Self::today().to_string();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let used: u32 = conn.incr(&key, 1).await?;
        let _: () = conn.expire(&key, USAGE_KEY_TTL).await?;

        tracing::debug!(
            used = used,
            quota = self.daily_quota,
            "Catalog usage incremented"
        );

        Ok(used)
    }
}

fn quota_status(used: u32, quota: u32) -> AppResult<()> {
    if used >= quota {
        tracing::error!(used = used, quota = quota, "Daily catalog quota exhausted");
        return Err(AppError::UpstreamUnavailable(
            "catalog quota exhausted for today".to_string(),
        ));
    }

    if used as f32 / quota as f32 > 0.8 {
        tracing::warn!(
            used = used,
            quota = quota,
            remaining = quota - used,
            "Catalog quota at 80%"
        );
    }

    Ok(())
}
