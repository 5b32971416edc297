use std::sync::Arc;
use std::time::Duration;

use config::Config;

const DEFAULT_REFRESH_INTERVAL_SECS: (&str, u64) = ("refresh-interval-secs", 120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period between full batch refreshes
    pub refresh_interval: Duration,
}

impl From<Arc<Config>> for SchedulerConfig {
    fn from(config: Arc<Config>) -> Self {
        let secs = config
            .get::<u64>(DEFAULT_REFRESH_INTERVAL_SECS.0)
            .ok()
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS.1);
        Self {
            refresh_interval: Duration::from_secs(secs),
        }
    }
}
