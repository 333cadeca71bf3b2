use std::net::IpAddr;

use async_trait::async_trait;
use tracing::debug;

use fleet_core::{HostError, HostResolver};

use crate::{DiscoverConfig, DiscoverError};

/// Looks up the host's public address with one bounded HTTP GET.
#[derive(Debug, Clone)]
pub struct PublicIpResolver {
    cfg: DiscoverConfig,
}

impl PublicIpResolver {
    pub fn new(cfg: DiscoverConfig) -> Self {
        Self { cfg }
    }

    pub async fn lookup(&self) -> Result<IpAddr, DiscoverError> {
        let client = reqwest::Client::builder()
            .timeout(self.cfg.timeout)
            .build()?;

        debug!(target: "fleet.discover", endpoint = %self.cfg.endpoint, "looking up public address");
        let response = client
            .get(&self.cfg.endpoint)
            // ifconfig.me answers browser agents with HTML
            .header(reqwest::header::USER_AGENT, "curl/8")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoverError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_address(&body)
    }
}

#[async_trait]
impl HostResolver for PublicIpResolver {
    async fn resolve(&self) -> Result<String, HostError> {
        Ok(self.lookup().await?.to_string())
    }
}

/// Parse a lookup response body: a single address, surrounding whitespace ignored.
pub fn parse_address(body: &str) -> Result<IpAddr, DiscoverError> {
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| DiscoverError::InvalidResponse(trimmed.chars().take(64).collect()))
}
