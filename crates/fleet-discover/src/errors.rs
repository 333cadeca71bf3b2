use fleet_core::HostError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("lookup request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("lookup endpoint answered {0}")]
    Status(u16),

    #[error("lookup returned {0:?}, not an IP address")]
    InvalidResponse(String),
}

impl From<DiscoverError> for HostError {
    fn from(e: DiscoverError) -> Self {
        match e {
            DiscoverError::HttpRequest(err) if err.is_timeout() => HostError::Timeout,
            DiscoverError::InvalidResponse(body) => HostError::InvalidAddress(body),
            other => HostError::Lookup(other.to_string()),
        }
    }
}
