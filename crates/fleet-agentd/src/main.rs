mod cli;
mod run;

use std::process::ExitCode;

use clap::Parser;
use fleet_observe::{LoggerConfig, logger_init};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_cfg = LoggerConfig::default()
        .with_level(cli.log_level.clone())
        .with_format(cli.log_format);
    if let Err(e) = logger_init(&log_cfg) {
        eprintln!("fleet: {e}");
        return run::setup_failure();
    }

    match run::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(target: "fleet.agentd", error = format!("{e:#}"), "fleet command failed");
            eprintln!("fleet: {e:#}");
            run::setup_failure()
        }
    }
}
