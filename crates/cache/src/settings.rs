use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of posts kept before the whole cache is flushed.
    pub max_size: usize,
    /// Scheme and host of the post API, without a trailing slash.
    pub api_base: String,
    /// Minimum time between two durable snapshot writes.
    pub flush_interval_ms: u64,
}
impl Settings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            max_size: 5_000,
            api_base: "https://gelbooru.com".to_string(),
            flush_interval_ms: 1_000,
        }
    }
}
