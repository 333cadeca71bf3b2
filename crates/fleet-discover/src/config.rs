use std::time::Duration;

use fleet_model::HostDiscoveryConfig;

#[derive(Debug, Clone)]
pub struct DiscoverConfig {
    /// Endpoint answering a plain GET with the caller's public address.
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self::from(&HostDiscoveryConfig::default())
    }
}

impl From<&HostDiscoveryConfig> for DiscoverConfig {
    fn from(cfg: &HostDiscoveryConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }
}
