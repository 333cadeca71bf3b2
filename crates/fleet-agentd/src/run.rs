use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use fleet_core::{Engine, HostResolver, Provisioner, Reclaimer, StaticHost};
use fleet_discover::{DiscoverConfig, PublicIpResolver};
use fleet_exec::{EngineKind, connect};
use fleet_model::{FleetConfig, LaunchResult, ProvisionReport, ReclaimOutcome, ReclaimReport};
use tracing::{info, warn};

use crate::cli::{Cli, Command};

/// Exit status for configuration, logging and engine connection errors.
pub fn setup_failure() -> ExitCode {
    ExitCode::from(2)
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut cfg = load_config(&cli)?;
    let kind = cli.engine;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Slots { status } => {
            let engine = if status {
                Some(engine(kind)?)
            } else {
                None
            };
            print_slots(&cfg, engine.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Provision {
            host,
            parallel,
            json,
        } => {
            cfg.parallel |= parallel;
            let resolver: Box<dyn HostResolver> = match host {
                Some(host) => Box::new(StaticHost(host)),
                None => Box::new(PublicIpResolver::new(DiscoverConfig::from(
                    &cfg.host_discovery,
                ))),
            };
            let provisioner = Provisioner::new(cfg, engine(kind)?);
            let report = provisioner.run(resolver.as_ref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_provision(&report);
            }
            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Reclaim { parallel, json } => {
            cfg.parallel |= parallel;
            let report = Reclaimer::new(cfg, engine(kind)?).run().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_reclaim(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FleetConfig> {
    let cfg = match &cli.config {
        Some(path) => {
            info!(target: "fleet.agentd", path = %path.display(), "loading fleet config");
            FleetConfig::load(path)?
        }
        None => FleetConfig::default(),
    };
    cfg.validate().context("invalid fleet config")?;
    Ok(cfg)
}

fn engine(kind: EngineKind) -> Result<Arc<dyn Engine>> {
    connect(kind).with_context(|| format!("connecting to {kind} engine"))
}

async fn print_slots(cfg: &FleetConfig, engine: Option<&dyn Engine>) -> Result<()> {
    let header = format!(
        "{:<16} {:<22} {:>8} {:>8}",
        "NAME", "RENDER DEVICE", "NOTEBOOK", "SERVICE"
    );
    match engine {
        Some(_) => println!("{header}  STATUS"),
        None => println!("{header}"),
    }

    for slot in cfg.slots()? {
        let row = format!(
            "{:<16} {:<22} {:>8} {:>8}",
            slot.name,
            slot.render_device(&cfg.render_device_dir),
            slot.notebook_port,
            slot.service_port
        );
        let Some(engine) = engine else {
            println!("{row}");
            continue;
        };
        let status = match engine.exists(&slot.name).await {
            Ok(true) => "present".to_string(),
            Ok(false) => "absent".to_string(),
            Err(e) => {
                warn!(target: "fleet.agentd", slot = %slot.name, error = %e, "status lookup failed");
                "unknown".to_string()
            }
        };
        println!("{row}  {status}");
    }
    Ok(())
}

fn print_provision(report: &ProvisionReport) {
    for slot in &report.slots {
        match &slot.result {
            LaunchResult::Ready { url, .. } => println!("{url}"),
            LaunchResult::NotReady { failure, .. } => {
                eprintln!("{}: not ready: {failure}", slot.slot.name)
            }
        }
    }
    eprintln!(
        "{}/{} slots ready on {}",
        report.urls().len(),
        report.slots.len(),
        report.host
    );
}

fn print_reclaim(report: &ReclaimReport) {
    for slot in &report.slots {
        match &slot.outcome {
            ReclaimOutcome::StoppedAndRemoved => {}
            ReclaimOutcome::StopFailed { reason } => {
                eprintln!("{}: removed, stop failed: {reason}", slot.slot.name)
            }
            ReclaimOutcome::RemoveFailed { reason, .. } => {
                eprintln!("{}: not removed: {reason}", slot.slot.name)
            }
        }
    }
    println!("{}/{} environments removed", report.removed(), report.slots.len());
}
