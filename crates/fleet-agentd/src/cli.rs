use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleet_exec::EngineKind;
use fleet_observe::LoggerFormat;

#[derive(Debug, Parser)]
#[command(
    name = "fleet",
    version,
    about = "Provision and reclaim per-accelerator notebook environments"
)]
pub struct Cli {
    /// JSON fleet configuration; built-in defaults when omitted
    #[arg(long, short, global = true, env = "FLEET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Container control plane: docker (Engine API) or cli (docker binary)
    #[arg(long, global = true, default_value = "docker")]
    pub engine: EngineKind,

    /// Log level or filter directive
    #[arg(long, global = true, default_value = "info", env = "FLEET_LOG")]
    pub log_level: String,

    /// text, json or journald
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LoggerFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch every slot and print the notebook URLs
    Provision {
        /// Use this address in URLs instead of looking it up
        #[arg(long)]
        host: Option<String>,
        /// Provision all slots concurrently
        #[arg(long)]
        parallel: bool,
        /// Print the full report as JSON instead of the URL list
        #[arg(long)]
        json: bool,
    },
    /// Stop and remove every slot's environment
    Reclaim {
        /// Reclaim all slots concurrently
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the derived slot table
    Slots {
        /// Ask the engine whether each environment exists
        #[arg(long)]
        status: bool,
    },
    /// Print the effective configuration as JSON
    Config,
}
