pub mod error;
pub use error::{CoreError, EngineError, HostError};

pub mod engine;
pub use engine::Engine;

pub mod clock;
pub use clock::{Sleeper, TokioSleeper};

pub mod host;
pub use host::{HostResolver, StaticHost, resolve_host_or_fallback};

pub mod notebook;

pub mod token;
pub use token::extract_token;

pub mod poll;
pub use poll::{PollOutcome, TokenPoller};

pub mod provision;
pub use provision::Provisioner;

pub mod reclaim;
pub use reclaim::Reclaimer;

#[cfg(test)]
pub(crate) mod testing;
