use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ModelError, RetryPolicy, WorkerSlot};

/// Render node minors of the accelerators on the reference host, in slot order.
pub const DEFAULT_RENDER_IDS: [u32; 8] = [128, 136, 144, 152, 160, 168, 176, 184];

/// Whole-fleet configuration.
///
/// Every field has a default matching the reference deployment, so a config file only needs
/// to name what it changes. Provisioning and reclamation must be run with the same values
/// for `render_ids`, `name_prefix` and the port fields, since slot identity is derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FleetConfig {
    /// Accelerator render ids, one slot per entry.
    ///
    /// Duplicates produce colliding environment names; they are not rejected.
    pub render_ids: Vec<u32>,
    /// Environment name is `<prefix><render id>`.
    pub name_prefix: String,
    pub notebook_base_port: u16,
    pub service_base_port: u16,
    /// Distance between the ports of two consecutive slots.
    pub port_step: u16,

    pub image: String,
    pub model_volume: VolumeMount,
    /// Device nodes shared by every slot.
    pub common_devices: Vec<String>,
    /// Directory holding `renderD<id>` nodes.
    pub render_device_dir: String,
    pub device_permissions: String,
    pub group_add: Vec<String>,
    pub security_opt: Vec<String>,
    pub cap_add: Vec<String>,
    pub ipc_mode: String,
    pub network_mode: String,
    pub working_dir: String,
    pub tty: bool,
    /// Variable carrying the slot's service port into the environment.
    pub service_port_env: String,

    /// Pause between creating an environment and the first exec into it.
    pub settle_delay_ms: u64,
    pub token_poll: RetryPolicy,
    pub notebook: NotebookConfig,
    pub host_discovery: HostDiscoveryConfig,

    /// Run every slot as its own task instead of one after another.
    pub parallel: bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            render_ids: DEFAULT_RENDER_IDS.to_vec(),
            name_prefix: "vllm_dev_".to_string(),
            notebook_base_port: 5000,
            service_base_port: 8000,
            port_step: 50,
            image: "rocm/vllm:instinct_main".to_string(),
            model_volume: VolumeMount::default(),
            common_devices: vec!["/dev/kfd".to_string()],
            render_device_dir: "/dev/dri".to_string(),
            device_permissions: "rwm".to_string(),
            group_add: vec!["video".to_string()],
            security_opt: vec!["seccomp=unconfined".to_string()],
            cap_add: vec!["SYS_PTRACE".to_string()],
            ipc_mode: "host".to_string(),
            network_mode: "host".to_string(),
            working_dir: "/workspace".to_string(),
            tty: true,
            service_port_env: "VLLM_PORT".to_string(),
            settle_delay_ms: 5_000,
            token_poll: RetryPolicy::default(),
            notebook: NotebookConfig::default(),
            host_discovery: HostDiscoveryConfig::default(),
            parallel: false,
        }
    }
}

impl FleetConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ModelError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Number of slots in the fleet.
    #[inline]
    pub fn size(&self) -> usize {
        self.render_ids.len()
    }

    /// Check that every slot derives ports inside `u16` and that the two port ranges are disjoint.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.render_ids.is_empty() {
            return Err(ModelError::EmptyFleet);
        }
        if self.port_step == 0 {
            return Err(ModelError::ZeroPortStep);
        }
        if self.token_poll.max_attempts == 0 {
            return Err(ModelError::ZeroAttempts);
        }

        let last = WorkerSlot::derive(self, self.size() - 1)?;
        let notebook = (self.notebook_base_port, last.notebook_port);
        let service = (self.service_base_port, last.service_port);
        if notebook.0 <= service.1 && service.0 <= notebook.1 {
            return Err(ModelError::PortRangesOverlap { notebook, service });
        }
        Ok(())
    }

    /// Derive every slot in fleet order.
    pub fn slots(&self) -> Result<Vec<WorkerSlot>, ModelError> {
        (0..self.size())
            .map(|index| WorkerSlot::derive(self, index))
            .collect()
    }
}

/// Access mode of a bind mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    Rw,
    Ro,
}

impl MountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountMode::Rw => "rw",
            MountMode::Ro => "ro",
        }
    }
}

/// Host directory mounted into every environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeMount {
    pub host_path: String,
    pub container_path: String,
    pub mode: MountMode,
}

impl VolumeMount {
    /// Docker bind syntax: `host:container:mode`.
    pub fn bind(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host_path,
            self.container_path,
            self.mode.as_str()
        )
    }
}

impl Default for VolumeMount {
    fn default() -> Self {
        Self {
            host_path: "/home/charyang/models".to_string(),
            container_path: "/models".to_string(),
            mode: MountMode::Rw,
        }
    }
}

/// Notebook server bootstrap inside each environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotebookConfig {
    pub python: String,
    /// Package installed with pip before the server starts.
    pub bootstrap_package: String,
    pub bind_address: String,
    /// Shell started as a login shell by notebook terminals.
    pub login_shell: String,
    /// Directory of the per-slot `jupyter-<port>.log` files.
    pub log_dir: String,
    pub log_tail_lines: u32,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            bootstrap_package: "jupyterlab".to_string(),
            bind_address: "0.0.0.0".to_string(),
            login_shell: "bash".to_string(),
            log_dir: "/workspace".to_string(),
            log_tail_lines: 20,
        }
    }
}

/// Public address lookup embedded in reported URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostDiscoveryConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Address used when the lookup fails.
    pub fallback: String,
}

impl Default for HostDiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ifconfig.me".to_string(),
            timeout_ms: 10_000,
            fallback: "127.0.0.1".to_string(),
        }
    }
}
