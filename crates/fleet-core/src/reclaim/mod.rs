use std::sync::Arc;

use fleet_model::{FleetConfig, ReclaimOutcome, ReclaimReport, ReclaimSlotReport, WorkerSlot};
use tracing::{error, info, warn};

use crate::{CoreError, Engine};

/// Stops and removes every slot's environment by its derived name.
///
/// Runs without any record of a previous provisioning run; failures are reported, never raised.
#[derive(Clone)]
pub struct Reclaimer {
    cfg: Arc<FleetConfig>,
    engine: Arc<dyn Engine>,
}

impl Reclaimer {
    pub fn new(cfg: FleetConfig, engine: Arc<dyn Engine>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            engine,
        }
    }

    pub async fn run(&self) -> Result<ReclaimReport, CoreError> {
        self.cfg.validate()?;
        let slots = self.cfg.slots()?;
        info!(target: "fleet.core.reclaim", engine = self.engine.name(), slots = slots.len(), "reclaiming fleet");

        let reports = if self.cfg.parallel {
            self.run_parallel(slots).await
        } else {
            let mut reports = Vec::with_capacity(slots.len());
            for slot in slots {
                let outcome = self.reclaim_slot(&slot).await;
                reports.push(ReclaimSlotReport { slot, outcome });
            }
            reports
        };

        let report = ReclaimReport::new(reports);
        info!(
            target: "fleet.core.reclaim",
            removed = report.removed(),
            total = report.slots.len(),
            "cleanup complete"
        );
        Ok(report)
    }

    async fn run_parallel(&self, slots: Vec<WorkerSlot>) -> Vec<ReclaimSlotReport> {
        let handles: Vec<_> = slots
            .into_iter()
            .map(|slot| {
                let this = self.clone();
                let task_slot = slot.clone();
                let handle = tokio::spawn(async move { this.reclaim_slot(&task_slot).await });
                (slot, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (slot, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                error!(target: "fleet.core.reclaim", slot = %slot.name, error = %e, "slot task aborted");
                ReclaimOutcome::RemoveFailed {
                    stop_error: None,
                    reason: format!("slot task aborted: {e}"),
                }
            });
            reports.push(ReclaimSlotReport { slot, outcome });
        }
        reports
    }

    /// Stop, then remove regardless of how stop went.
    pub async fn reclaim_slot(&self, slot: &WorkerSlot) -> ReclaimOutcome {
        let name = slot.name.as_str();

        info!(target: "fleet.core.reclaim", slot = name, "stopping environment");
        let stop_error = match self.engine.stop(name).await {
            Ok(()) => None,
            Err(e) => {
                warn!(target: "fleet.core.reclaim", slot = name, error = %e, "could not stop environment (it may not be running)");
                Some(e.to_string())
            }
        };

        info!(target: "fleet.core.reclaim", slot = name, "removing environment");
        match self.engine.remove(name).await {
            Ok(()) => {
                info!(target: "fleet.core.reclaim", slot = name, "environment removed");
                match stop_error {
                    None => ReclaimOutcome::StoppedAndRemoved,
                    Some(reason) => ReclaimOutcome::StopFailed { reason },
                }
            }
            Err(e) => {
                warn!(target: "fleet.core.reclaim", slot = name, error = %e, "could not remove environment (it may not exist)");
                ReclaimOutcome::RemoveFailed {
                    stop_error,
                    reason: e.to_string(),
                }
            }
        }
    }
}
