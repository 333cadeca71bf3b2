mod args;
pub use args::{classify_stderr, exec_args, run_args, run_error};

use std::process::Output;

use async_trait::async_trait;
use tracing::{debug, trace};

use fleet_core::{Engine, EngineError};
use fleet_model::{EnvironmentSpec, ExecCommand, ExecOutput};

use crate::{
    ExecError,
    util::{cmd_program, combined, text},
};

/// Engine that drives the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct CliEngine {
    program: String,
}

impl CliEngine {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }

    /// Use another Docker-compatible client binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn invoke(&self, args: &[String]) -> Result<Output, ExecError> {
        trace!(target: "fleet.exec.cli", program = %self.program, ?args, "spawn");
        let out = cmd_program(&self.program, args)
            .output()
            .await
            .map_err(|e| ExecError::Spawn(format!("{}: {e}", self.program)))?;
        if out.status.code().is_none() {
            return Err(ExecError::KilledBySignal);
        }
        Ok(out)
    }

    /// Run a client command whose only interesting result is success.
    async fn invoke_checked(&self, target: &str, args: &[String]) -> Result<String, EngineError> {
        let out = self.invoke(args).await?;
        if out.status.success() {
            return Ok(text(&out.stdout));
        }
        let stderr = text(&out.stderr);
        debug!(target: "fleet.exec.cli", code = ?out.status.code(), %stderr, "client exited non-zero");
        Err(classify_stderr(target, &stderr).unwrap_or(EngineError::Api { reason: stderr }))
    }
}

impl Default for CliEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for CliEngine {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn create(&self, spec: &EnvironmentSpec) -> Result<(), EngineError> {
        let out = self.invoke(&run_args(spec)).await?;
        if out.status.success() {
            debug!(target: "fleet.exec.cli", name = %spec.name, id = %text(&out.stdout), "container started");
            return Ok(());
        }
        Err(run_error(&spec.image, &text(&out.stderr)))
    }

    async fn exec(&self, name: &str, cmd: &ExecCommand) -> Result<ExecOutput, EngineError> {
        let out = self.invoke(&exec_args(name, cmd, false)).await?;
        if !out.status.success()
            && let Some(err) = classify_stderr(name, &text(&out.stderr))
        {
            return Err(err);
        }
        Ok(ExecOutput {
            exit_code: out.status.code().map(i64::from),
            output: combined(&out.stdout, &out.stderr),
        })
    }

    async fn exec_detached(&self, name: &str, cmd: &ExecCommand) -> Result<(), EngineError> {
        self.invoke_checked(name, &exec_args(name, cmd, true))
            .await
            .map(|_| ())
    }

    async fn stop(&self, name: &str) -> Result<(), EngineError> {
        self.invoke_checked(name, &["stop".to_string(), name.to_string()])
            .await
            .map(|_| ())
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        self.invoke_checked(name, &["rm".to_string(), name.to_string()])
            .await
            .map(|_| ())
    }

    async fn exists(&self, name: &str) -> Result<bool, EngineError> {
        let args = [
            "container".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Name}}".to_string(),
            name.to_string(),
        ];
        match self.invoke_checked(name, &args).await {
            Ok(_) => Ok(true),
            Err(EngineError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
