use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("fleet has no accelerators configured")]
    EmptyFleet,
    #[error("port step must be greater than zero")]
    ZeroPortStep,
    #[error("token poll needs at least one attempt")]
    ZeroAttempts,
    #[error("slot {index} is out of range (fleet size {size})")]
    SlotOutOfRange { index: usize, size: usize },
    #[error("{which} port for slot {index} overflows u16")]
    PortOverflow { which: &'static str, index: usize },
    #[error("notebook ports {notebook:?} overlap service ports {service:?}")]
    PortRangesOverlap {
        notebook: (u16, u16),
        service: (u16, u16),
    },
    #[error("failed to read config {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
