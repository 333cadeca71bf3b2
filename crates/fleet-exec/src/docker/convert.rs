use bollard::{
    container::Config,
    errors::Error as BollardError,
    models::{DeviceMapping, HostConfig},
};
use fleet_core::EngineError;
use fleet_model::EnvironmentSpec;

/// Engine operation an error came from; decides how status codes are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Start,
    Exec,
    Stop,
    Remove,
    Inspect,
}

pub fn container_config(spec: &EnvironmentSpec) -> Config<String> {
    let devices = spec
        .devices
        .iter()
        .map(|d| DeviceMapping {
            path_on_host: Some(d.path_on_host.clone()),
            path_in_container: Some(d.path_in_container.clone()),
            cgroup_permissions: Some(d.permissions.clone()),
        })
        .collect::<Vec<_>>();

    let host_config = HostConfig {
        binds: some_vec(&spec.binds),
        devices: (!devices.is_empty()).then_some(devices),
        group_add: some_vec(&spec.group_add),
        security_opt: some_vec(&spec.security_opt),
        cap_add: some_vec(&spec.cap_add),
        ipc_mode: spec.ipc_mode.clone(),
        network_mode: spec.network_mode.clone(),
        ..Default::default()
    };

    let env = spec.env.assignments();
    Config {
        image: Some(spec.image.clone()),
        env: (!env.is_empty()).then_some(env),
        tty: Some(spec.tty),
        working_dir: spec.working_dir.clone(),
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn some_vec(v: &[String]) -> Option<Vec<String>> {
    (!v.is_empty()).then(|| v.to_vec())
}

/// Map a daemon error to the engine taxonomy.
///
/// `target` is the image for [`Op::Create`] and the environment name otherwise.
pub fn classify(op: Op, target: &str, err: BollardError) -> EngineError {
    match err {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => match (op, status_code) {
            (Op::Create, 404) => EngineError::ImageMissing {
                image: target.to_string(),
            },
            (Op::Start, _) => EngineError::LaunchFailed {
                reason: format!("{status_code}: {message}"),
            },
            (_, 404) => EngineError::NotFound {
                name: target.to_string(),
            },
            (Op::Stop, 304) => EngineError::NotRunning {
                name: target.to_string(),
            },
            (Op::Exec, 409) => EngineError::NotRunning {
                name: target.to_string(),
            },
            _ => EngineError::Api {
                reason: format!("{status_code}: {message}"),
            },
        },
        other => EngineError::Unclassified {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use fleet_model::{FleetConfig, WorkerSlot};

    use super::*;

    fn server_error(status_code: u16, message: &str) -> BollardError {
        BollardError::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn config_carries_slot_devices_and_namespaces() {
        let cfg = FleetConfig::default();
        let slot = WorkerSlot::derive(&cfg, 0).unwrap();
        let config = container_config(&EnvironmentSpec::for_slot(&cfg, &slot));

        assert_eq!(config.image.as_deref(), Some("rocm/vllm:instinct_main"));
        assert_eq!(config.env, Some(vec!["VLLM_PORT=8000".to_string()]));
        assert_eq!(config.tty, Some(true));
        assert_eq!(config.working_dir.as_deref(), Some("/workspace"));

        let host = config.host_config.unwrap();
        let devices = host.devices.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(
            devices[1].path_on_host.as_deref(),
            Some("/dev/dri/renderD128")
        );
        assert_eq!(devices[1].cgroup_permissions.as_deref(), Some("rwm"));
        assert_eq!(
            host.binds,
            Some(vec!["/home/charyang/models:/models:rw".to_string()])
        );
        assert_eq!(host.group_add, Some(vec!["video".to_string()]));
        assert_eq!(host.cap_add, Some(vec!["SYS_PTRACE".to_string()]));
        assert_eq!(
            host.security_opt,
            Some(vec!["seccomp=unconfined".to_string()])
        );
        assert_eq!(host.ipc_mode.as_deref(), Some("host"));
        assert_eq!(host.network_mode.as_deref(), Some("host"));
    }

    #[test]
    fn create_404_is_missing_image() {
        let err = classify(Op::Create, "img:1", server_error(404, "No such image: img:1"));
        assert_eq!(err, EngineError::ImageMissing { image: "img:1".into() });
    }

    #[test]
    fn start_errors_are_launch_failures() {
        let err = classify(
            Op::Start,
            "vllm_dev_128",
            server_error(500, "error gathering device information"),
        );
        assert!(matches!(err, EngineError::LaunchFailed { reason } if reason.contains("device")));
    }

    #[test]
    fn stop_and_remove_statuses() {
        assert_eq!(
            classify(Op::Stop, "n", server_error(304, "")),
            EngineError::NotRunning { name: "n".into() }
        );
        assert_eq!(
            classify(Op::Remove, "n", server_error(404, "No such container: n")),
            EngineError::NotFound { name: "n".into() }
        );
        assert!(matches!(
            classify(Op::Remove, "n", server_error(409, "conflict")),
            EngineError::Api { .. }
        ));
    }
}
