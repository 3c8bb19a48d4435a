pub mod usage;

pub use usage::create_redis_client;
pub use usage::UsageKey;
pub use usage::UsageMeter;
