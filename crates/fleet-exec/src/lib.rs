mod error;
pub use error::ExecError;

mod util;

#[cfg(feature = "docker")]
pub mod docker;
#[cfg(feature = "docker")]
pub use docker::DockerEngine;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub use cli::CliEngine;

mod select;
pub use select::{EngineKind, connect};
