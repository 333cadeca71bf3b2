use fleet_core::EngineError;
use thiserror::Error;

/// Failure running a host process.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("killed by signal")]
    KilledBySignal,
    #[error("unknown engine {0:?} (expected: docker|cli)")]
    UnknownEngine(String),
}

impl From<ExecError> for EngineError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Spawn(reason) => EngineError::Unavailable { reason },
            other => EngineError::Unclassified {
                reason: other.to_string(),
            },
        }
    }
}
