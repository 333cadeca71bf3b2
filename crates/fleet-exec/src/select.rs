use std::{fmt, str::FromStr, sync::Arc};

use fleet_core::{Engine, EngineError};

use crate::ExecError;

/// Which control plane the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Docker Engine API over the local socket.
    #[default]
    Docker,
    /// The `docker` command-line client.
    Cli,
}

impl FromStr for EngineKind {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" | "api" => Ok(EngineKind::Docker),
            "cli" => Ok(EngineKind::Cli),
            _ => Err(ExecError::UnknownEngine(s.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Docker => "docker",
            EngineKind::Cli => "cli",
        })
    }
}

pub fn connect(kind: EngineKind) -> Result<Arc<dyn Engine>, EngineError> {
    match kind {
        #[cfg(feature = "docker")]
        EngineKind::Docker => Ok(Arc::new(crate::DockerEngine::connect()?)),
        #[cfg(feature = "cli")]
        EngineKind::Cli => Ok(Arc::new(crate::CliEngine::new())),
        #[allow(unreachable_patterns)]
        other => Err(EngineError::Unavailable {
            reason: format!("engine backend {other} is not compiled in"),
        }),
    }
}
