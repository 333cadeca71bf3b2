use serde::{Deserialize, Serialize};

use crate::{EnvVars, FleetConfig, WorkerSlot};

/// Host device node exposed inside an environment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBinding {
    pub path_on_host: String,
    pub path_in_container: String,
    /// Cgroup permissions, e.g. `"rwm"`.
    pub permissions: String,
}

impl DeviceBinding {
    /// Same path on both sides.
    pub fn identity(path: impl Into<String>, permissions: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path_on_host: path.clone(),
            path_in_container: path,
            permissions: permissions.into(),
        }
    }

    /// Docker CLI syntax: `host:container:perms`.
    pub fn as_cli_arg(&self) -> String {
        format!(
            "{}:{}:{}",
            self.path_on_host, self.path_in_container, self.permissions
        )
    }
}

/// Engine-neutral request to create and start one isolated environment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    pub name: String,
    pub image: String,
    /// Bind mounts in `host:container:mode` form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binds: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceBinding>,
    #[serde(default, skip_serializing_if = "EnvVars::is_empty")]
    pub env: EnvVars,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub tty: bool,
}

impl EnvironmentSpec {
    /// Creation request for `slot`: shared volume, common devices plus the slot's render node,
    /// host IPC and network, and the service port exported as an environment variable.
    pub fn for_slot(cfg: &FleetConfig, slot: &WorkerSlot) -> Self {
        let mut devices: Vec<DeviceBinding> = cfg
            .common_devices
            .iter()
            .map(|dev| DeviceBinding::identity(dev.as_str(), cfg.device_permissions.as_str()))
            .collect();
        devices.push(DeviceBinding::identity(
            slot.render_device(&cfg.render_device_dir),
            cfg.device_permissions.as_str(),
        ));

        let mut env = EnvVars::new();
        if !cfg.service_port_env.is_empty() {
            env.push(cfg.service_port_env.as_str(), slot.service_port.to_string());
        }

        Self {
            name: slot.name.clone(),
            image: cfg.image.clone(),
            binds: vec![cfg.model_volume.bind()],
            devices,
            env,
            group_add: cfg.group_add.clone(),
            security_opt: cfg.security_opt.clone(),
            cap_add: cfg.cap_add.clone(),
            ipc_mode: non_empty(&cfg.ipc_mode),
            network_mode: non_empty(&cfg.network_mode),
            working_dir: non_empty(&cfg.working_dir),
            tty: cfg.tty,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
