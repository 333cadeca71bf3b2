use serde::{Deserialize, Serialize};

use crate::{FleetConfig, ModelError, RenderId};

/// One logical worker position, bound to a single accelerator.
///
/// Every field is a pure function of [`FleetConfig`] and the slot index, so a later process
/// derives the same identity without reading anything the provisioning run produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSlot {
    pub index: usize,
    pub render_id: RenderId,
    pub name: String,
    pub notebook_port: u16,
    pub service_port: u16,
}

impl WorkerSlot {
    pub fn derive(cfg: &FleetConfig, index: usize) -> Result<Self, ModelError> {
        let render_id = *cfg
            .render_ids
            .get(index)
            .ok_or(ModelError::SlotOutOfRange {
                index,
                size: cfg.size(),
            })?;

        Ok(Self {
            index,
            render_id,
            name: format!("{}{}", cfg.name_prefix, render_id),
            notebook_port: offset_port(cfg.notebook_base_port, cfg.port_step, index)
                .ok_or(ModelError::PortOverflow {
                    which: "notebook",
                    index,
                })?,
            service_port: offset_port(cfg.service_base_port, cfg.port_step, index)
                .ok_or(ModelError::PortOverflow {
                    which: "service",
                    index,
                })?,
        })
    }

    /// Slot-specific render node, e.g. `/dev/dri/renderD128`.
    pub fn render_device(&self, dir: &str) -> String {
        format!("{}/renderD{}", dir.trim_end_matches('/'), self.render_id)
    }

    /// Notebook server log inside the environment.
    pub fn log_path(&self, dir: &str) -> String {
        format!(
            "{}/jupyter-{}.log",
            dir.trim_end_matches('/'),
            self.notebook_port
        )
    }
}

fn offset_port(base: u16, step: u16, index: usize) -> Option<u16> {
    let index = u16::try_from(index).ok()?;
    step.checked_mul(index)?.checked_add(base)
}
