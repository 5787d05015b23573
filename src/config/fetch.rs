use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Options the bridge attaches to every reactive query it hands out
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FetchConfig {
    /// Retries the pull cache should perform for a failed one-shot fetch.
    /// The push layer already redelivers over its own connection, so the
    /// default is 0.
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Staleness window in milliseconds. `None` means entries never go stale;
    /// the watch keeps them current.
    #[serde(default)]
    pub stale_time_ms: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry: default_retry(),
            stale_time_ms: None,
        }
    }
}

impl FetchConfig {
    /// `None` = never stale
    pub fn stale_time(&self) -> Option<Duration> {
        self.stale_time_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stale_time_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "fetch.stale_time_ms cannot be 0; omit it for never-stale entries".into(),
            ));
        }

        if self.retry > MAX_RETRY {
            return Err(Error::InvalidConfig(format!(
                "fetch.retry {} exceeds maximum of {}",
                self.retry, MAX_RETRY
            )));
        }

        if self.retry > 0 {
            warn!(
                "fetch.retry set to {}: failed fetches will be retried by the cache on top of push redelivery",
                self.retry
            );
        }

        Ok(())
    }
}

const MAX_RETRY: u32 = 10;

fn default_retry() -> u32 {
    0
}
