use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission queue tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound on requests in flight at once.
    pub parallel_requests: usize,
    /// Requeues allowed for transient failures before giving up.
    pub max_retry_count: u32,
    /// Pause after a 429 before the request goes back to pending.
    pub rate_limit_delay_ms: u64,
}
impl Settings {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            parallel_requests: 5,
            max_retry_count: 5,
            rate_limit_delay_ms: 15_000,
        }
    }
}
