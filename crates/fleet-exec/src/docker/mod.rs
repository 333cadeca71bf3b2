mod convert;
pub use convert::{Op, classify, container_config};

use async_trait::async_trait;
use bollard::{
    Docker,
    container::{
        CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
        StopContainerOptions,
    },
    exec::{CreateExecOptions, StartExecOptions, StartExecResults},
};
use futures_util::StreamExt;
use tracing::{debug, trace};

use fleet_core::{Engine, EngineError};
use fleet_model::{EnvironmentSpec, ExecCommand, ExecOutput};

/// Grace period before the daemon kills a stopping container.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Engine backed by the Docker Engine API.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    pub fn connect() -> Result<Self, EngineError> {
        let docker =
            Docker::connect_with_local_defaults().map_err(|e| EngineError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(Self { docker })
    }

    async fn create_exec(&self, name: &str, cmd: &ExecCommand) -> Result<String, EngineError> {
        let options = CreateExecOptions {
            cmd: Some(cmd.argv.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            working_dir: cmd.workdir.clone(),
            ..Default::default()
        };
        let created = self
            .docker
            .create_exec(name, options)
            .await
            .map_err(|e| classify(Op::Exec, name, e))?;
        Ok(created.id)
    }
}

#[async_trait]
impl Engine for DockerEngine {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn create(&self, spec: &EnvironmentSpec) -> Result<(), EngineError> {
        trace!(target: "fleet.exec.docker", name = %spec.name, image = %spec.image, "create container");
        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            ..Default::default()
        };
        let created = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| classify(Op::Create, &spec.image, e))?;
        for warning in &created.warnings {
            debug!(target: "fleet.exec.docker", name = %spec.name, %warning, "create warning");
        }

        self.docker
            .start_container::<String>(&spec.name, None)
            .await
            .map_err(|e| classify(Op::Start, &spec.name, e))?;
        debug!(target: "fleet.exec.docker", name = %spec.name, id = %created.id, "container started");
        Ok(())
    }

    async fn exec(&self, name: &str, cmd: &ExecCommand) -> Result<ExecOutput, EngineError> {
        trace!(target: "fleet.exec.docker", name, program = cmd.program(), "exec");
        let id = self.create_exec(name, cmd).await?;

        let mut output = String::new();
        match self
            .docker
            .start_exec(&id, None)
            .await
            .map_err(|e| classify(Op::Exec, name, e))?
        {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| classify(Op::Exec, name, e))?;
                    output.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
                }
            }
            StartExecResults::Detached => {}
        }

        let inspected = self
            .docker
            .inspect_exec(&id)
            .await
            .map_err(|e| classify(Op::Exec, name, e))?;
        trace!(target: "fleet.exec.docker", name, exit_code = ?inspected.exit_code, "exec finished");

        Ok(ExecOutput {
            exit_code: inspected.exit_code,
            output,
        })
    }

    async fn exec_detached(&self, name: &str, cmd: &ExecCommand) -> Result<(), EngineError> {
        trace!(target: "fleet.exec.docker", name, program = cmd.program(), "exec detached");
        let id = self.create_exec(name, cmd).await?;
        let options = StartExecOptions {
            detach: true,
            ..Default::default()
        };
        self.docker
            .start_exec(&id, Some(options))
            .await
            .map_err(|e| classify(Op::Exec, name, e))?;
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .stop_container(
                name,
                Some(StopContainerOptions {
                    t: STOP_TIMEOUT_SECS,
                }),
            )
            .await
            .map_err(|e| classify(Op::Stop, name, e))
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: false,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| classify(Op::Remove, name, e))
    }

    async fn exists(&self, name: &str) -> Result<bool, EngineError> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(Op::Inspect, name, e) {
                EngineError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }
}
