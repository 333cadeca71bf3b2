use serde::{Deserialize, Serialize};

use crate::{LaunchResult, ReclaimOutcome, SlotFailure, WorkerSlot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotReport {
    pub slot: WorkerSlot,
    pub result: LaunchResult,
}

/// Outcome of one provisioning run, ordered by slot index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    /// Address embedded in the URLs.
    pub host: String,
    pub slots: Vec<SlotReport>,
}

impl ProvisionReport {
    pub fn new(host: impl Into<String>, mut slots: Vec<SlotReport>) -> Self {
        slots.sort_by_key(|r| r.slot.index);
        Self {
            host: host.into(),
            slots,
        }
    }

    /// URLs of every ready slot, in slot order.
    pub fn urls(&self) -> Vec<&str> {
        self.slots.iter().filter_map(|r| r.result.url()).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&WorkerSlot, &SlotFailure)> {
        self.slots.iter().filter_map(|r| match &r.result {
            LaunchResult::NotReady { failure, .. } => Some((&r.slot, failure)),
            LaunchResult::Ready { .. } => None,
        })
    }

    /// Returns `true` if every slot is ready.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|r| r.result.is_ready())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclaimSlotReport {
    pub slot: WorkerSlot,
    pub outcome: ReclaimOutcome,
}

/// Outcome of one reclamation run, ordered by slot index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclaimReport {
    pub slots: Vec<ReclaimSlotReport>,
}

impl ReclaimReport {
    pub fn new(mut slots: Vec<ReclaimSlotReport>) -> Self {
        slots.sort_by_key(|r| r.slot.index);
        Self { slots }
    }

    pub fn removed(&self) -> usize {
        self.slots.iter().filter(|r| r.outcome.is_removed()).count()
    }
}
