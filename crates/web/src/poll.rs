//! Fixed-interval existence poller.
//!
//! ```ignore
//! let config = PollConfig::default();
//! let found = wait_for(|| std::fs::metadata(&path).ok(), &config).await;
//! ```

use crate::validate::is_truthy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default delay between checks.
const DEFAULT_INTERVAL_MS: u64 = 100;

/// Default number of checks before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    #[serde(with = "millis")]
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Calls `check` once per tick until it returns `Some`.
///
/// The first check runs one interval after the call. Resolves to `None` once
/// `max_attempts` checks have come back empty; zero attempts never checks.
pub async fn wait_for<T, F>(mut check: F, config: &PollConfig) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    if config.max_attempts == 0 {
        return None;
    }

    let period = config.interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for attempt in 1..=config.max_attempts {
        ticker.tick().await;
        if let Some(found) = check() {
            tracing::debug!(attempt, "poll satisfied");
            return Some(found);
        }
    }

    tracing::debug!(
        attempts = config.max_attempts,
        interval_ms = period.as_millis() as u64,
        "poll exhausted"
    );
    None
}

/// [`wait_for`] over a JSON check, resolving on the first truthy value.
pub async fn wait_for_truthy<F>(mut check: F, config: &PollConfig) -> Option<Value>
where
    F: FnMut() -> Value,
{
    wait_for(
        || {
            let value = check();
            is_truthy(&value).then_some(value)
        },
        config,
    )
    .await
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
