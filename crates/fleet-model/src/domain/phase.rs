use std::fmt;

use serde::{Deserialize, Serialize};

/// Provisioning progress of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotPhase {
    /// Creation requested from the engine.
    Created,
    /// Accelerator nodes attached to the environment.
    DevicesBound,
    /// Environment started.
    Running,
    /// Bootstrap package install attempted.
    BootstrapInstalled,
    /// Notebook server launched in the background.
    ServerStarted,
    /// Polling the server for its token.
    AwaitingToken,
    /// Token found; endpoint is usable.
    Ready,
    /// Poll budget exhausted without a token.
    TimedOut,
}

impl SlotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotPhase::Created => "created",
            SlotPhase::DevicesBound => "devices-bound",
            SlotPhase::Running => "running",
            SlotPhase::BootstrapInstalled => "bootstrap-installed",
            SlotPhase::ServerStarted => "server-started",
            SlotPhase::AwaitingToken => "awaiting-token",
            SlotPhase::Ready => "ready",
            SlotPhase::TimedOut => "timed-out",
        }
    }

    /// Returns `true` once the slot won't transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SlotPhase::Ready | SlotPhase::TimedOut)
    }
}

impl fmt::Display for SlotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
