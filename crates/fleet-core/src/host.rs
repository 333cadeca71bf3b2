use async_trait::async_trait;
use tracing::{info, warn};

use crate::HostError;

/// Source of the address embedded in reported URLs.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self) -> Result<String, HostError>;
}

/// Resolver that always answers with the same address.
#[derive(Debug, Clone)]
pub struct StaticHost(pub String);

#[async_trait]
impl HostResolver for StaticHost {
    async fn resolve(&self) -> Result<String, HostError> {
        Ok(self.0.clone())
    }
}

/// Resolve the host once; any failure yields `fallback`.
///
/// The address only decorates URLs, so discovery errors never fail a run.
pub async fn resolve_host_or_fallback(resolver: &dyn HostResolver, fallback: &str) -> String {
    match resolver.resolve().await {
        Ok(host) => {
            info!(target: "fleet.core.host", %host, "host address resolved");
            host
        }
        Err(e) => {
            warn!(target: "fleet.core.host", error = %e, fallback, "could not resolve host address; using fallback");
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FailingHost;

    #[tokio::test]
    async fn static_host_is_used() {
        let host = resolve_host_or_fallback(&StaticHost("203.0.113.9".into()), "127.0.0.1").await;
        assert_eq!(host, "203.0.113.9");
    }

    #[tokio::test]
    async fn failure_falls_back() {
        let host = resolve_host_or_fallback(&FailingHost(HostError::Timeout), "127.0.0.1").await;
        assert_eq!(host, "127.0.0.1");
    }
}
