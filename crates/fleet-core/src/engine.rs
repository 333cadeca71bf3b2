use async_trait::async_trait;
use fleet_model::{EnvironmentSpec, ExecCommand, ExecOutput};

use crate::EngineError;

/// Container control plane, keyed by environment name.
///
/// Implementations must be safe to share between slot tasks.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Create and start an environment.
    async fn create(&self, spec: &EnvironmentSpec) -> Result<(), EngineError>;

    /// Run `cmd` in the foreground and capture its combined output.
    async fn exec(&self, name: &str, cmd: &ExecCommand) -> Result<ExecOutput, EngineError>;

    /// Start `cmd` and return without waiting for it.
    async fn exec_detached(&self, name: &str, cmd: &ExecCommand) -> Result<(), EngineError>;

    async fn stop(&self, name: &str) -> Result<(), EngineError>;

    async fn remove(&self, name: &str) -> Result<(), EngineError>;

    async fn exists(&self, name: &str) -> Result<bool, EngineError>;
}
