use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a slot did not become ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum SlotFailure {
    /// Base image is not present on the engine host.
    ImageMissing { image: String },
    /// The engine accepted the request but the environment failed to start.
    EnvironmentLaunchFailure { reason: String },
    /// Any other engine error; `unclassified` marks errors the engine did not categorise.
    EngineApiError { reason: String, unclassified: bool },
    /// Poll budget exhausted without seeing a token.
    TokenNotFound { attempts: u32 },
}

impl fmt::Display for SlotFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotFailure::ImageMissing { image } => {
                write!(f, "image '{image}' not found; pull or build it first")
            }
            SlotFailure::EnvironmentLaunchFailure { reason } => {
                write!(f, "environment failed to launch: {reason}")
            }
            SlotFailure::EngineApiError {
                reason,
                unclassified: true,
            } => write!(f, "engine error (unclassified): {reason}"),
            SlotFailure::EngineApiError { reason, .. } => write!(f, "engine error: {reason}"),
            SlotFailure::TokenNotFound { attempts } => {
                write!(f, "no token after {attempts} attempt(s)")
            }
        }
    }
}

/// Final provisioning state of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "state")]
pub enum LaunchResult {
    Ready {
        url: String,
        service_port: u16,
    },
    NotReady {
        failure: SlotFailure,
        /// Last lines of the notebook log, when they could be fetched.
        diagnostic_tail: Option<String>,
    },
}

impl LaunchResult {
    pub fn not_ready(failure: SlotFailure) -> Self {
        LaunchResult::NotReady {
            failure,
            diagnostic_tail: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LaunchResult::Ready { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            LaunchResult::Ready { url, .. } => Some(url),
            LaunchResult::NotReady { .. } => None,
        }
    }
}

/// Result of tearing down one slot. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "outcome")]
pub enum ReclaimOutcome {
    StoppedAndRemoved,
    /// Stop failed (typically not running) but remove succeeded.
    StopFailed { reason: String },
    /// Remove failed (typically absent); `stop_error` is set when stop failed too.
    RemoveFailed {
        stop_error: Option<String>,
        reason: String,
    },
}

impl ReclaimOutcome {
    /// Returns `true` when the environment is known to be gone.
    pub fn is_removed(&self) -> bool {
        !matches!(self, ReclaimOutcome::RemoveFailed { .. })
    }
}
