mod env;
pub use env::{EnvVars, KeyValue};

mod slot;
pub use slot::WorkerSlot;

mod retry;
pub use retry::RetryPolicy;

mod phase;
pub use phase::SlotPhase;

mod outcome;
pub use outcome::{LaunchResult, ReclaimOutcome, SlotFailure};

mod report;
pub use report::{ProvisionReport, ReclaimReport, ReclaimSlotReport, SlotReport};

/// Render node minor of one accelerator (`/dev/dri/renderD<id>`).
pub type RenderId = u32;
