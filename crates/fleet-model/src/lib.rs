mod error;
pub use error::ModelError;

mod config;
pub use config::{
    FleetConfig, HostDiscoveryConfig, MountMode, NotebookConfig, VolumeMount, DEFAULT_RENDER_IDS,
};

mod domain;
pub use domain::*;

mod kind;
pub use kind::*;
