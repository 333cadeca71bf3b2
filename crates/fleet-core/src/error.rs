use fleet_model::{ModelError, SlotFailure};
use thiserror::Error;

/// Failure reported by an [`Engine`](crate::Engine) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("image not found: {image}")]
    ImageMissing { image: String },
    #[error("launch failed: {reason}")]
    LaunchFailed { reason: String },
    #[error("no such environment: {name}")]
    NotFound { name: String },
    #[error("environment is not running: {name}")]
    NotRunning { name: String },
    #[error("engine api error: {reason}")]
    Api { reason: String },
    #[error("engine unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("unclassified engine error: {reason}")]
    Unclassified { reason: String },
}

impl EngineError {
    /// Map an error that ended a slot's provisioning to its reported failure.
    pub fn into_failure(self) -> SlotFailure {
        match self {
            EngineError::ImageMissing { image } => SlotFailure::ImageMissing { image },
            EngineError::LaunchFailed { reason } => {
                SlotFailure::EnvironmentLaunchFailure { reason }
            }
            EngineError::Unclassified { reason } => SlotFailure::EngineApiError {
                reason,
                unclassified: true,
            },
            other => SlotFailure::EngineApiError {
                reason: other.to_string(),
                unclassified: false,
            },
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("host lookup timed out")]
    Timeout,
    #[error("host lookup failed: {0}")]
    Lookup(String),
    #[error("host lookup returned an invalid address: {0:?}")]
    InvalidAddress(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid fleet configuration: {0}")]
    Config(#[from] ModelError),
}
