use std::sync::Arc;

use config::Config;
use portfolio_common::caip::NAMESPACE_COSMOS;

const DEFAULT_STREAM_ONLY_CONFIRMED_NAMESPACES: (&str, &[&str]) =
    ("stream-only-confirmed-namespaces", &[NAMESPACE_COSMOS]);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// CAIP-2 namespaces whose transaction feed only delivers confirmed transactions
    pub stream_only_confirmed_namespaces: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            stream_only_confirmed_namespaces: DEFAULT_STREAM_ONLY_CONFIRMED_NAMESPACES
                .1
                .iter()
                .map(|namespace| namespace.to_string())
                .collect(),
        }
    }
}

impl From<Arc<Config>> for TrackerConfig {
    fn from(config: Arc<Config>) -> Self {
        match config.get::<Vec<String>>(DEFAULT_STREAM_ONLY_CONFIRMED_NAMESPACES.0) {
            Ok(namespaces) => Self {
                stream_only_confirmed_namespaces: namespaces,
            },
            Err(_) => Self::default(),
        }
    }
}
