mod environment;
pub use environment::{DeviceBinding, EnvironmentSpec};

mod exec;
pub use exec::{ExecCommand, ExecOutput};
