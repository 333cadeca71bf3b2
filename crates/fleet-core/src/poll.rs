use fleet_model::{ExecCommand, RetryPolicy};
use tracing::{debug, info, warn};

use crate::{Engine, Sleeper, extract_token};

/// Result of a bounded token poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Found { token: String, attempt: u32 },
    Exhausted { attempts: u32 },
}

/// Runs a listing command inside an environment until its output carries a token.
///
/// Each attempt is preceded by one `interval` sleep, so an exhausted poll sleeps exactly
/// `max_attempts` times.
pub struct TokenPoller<'a> {
    engine: &'a dyn Engine,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> TokenPoller<'a> {
    pub fn new(engine: &'a dyn Engine, sleeper: &'a dyn Sleeper, policy: RetryPolicy) -> Self {
        Self {
            engine,
            sleeper,
            policy,
        }
    }

    pub async fn poll(&self, name: &str, cmd: &ExecCommand) -> PollOutcome {
        for attempt in 1..=self.policy.max_attempts {
            self.sleeper.sleep(self.policy.interval()).await;

            let out = match self.engine.exec(name, cmd).await {
                Ok(out) => out,
                Err(e) => {
                    warn!(target: "fleet.core.poll", slot = name, attempt, error = %e, "token probe failed");
                    continue;
                }
            };

            let text = out.trimmed();
            if text.is_empty() {
                debug!(target: "fleet.core.poll", slot = name, attempt, "no servers listed yet");
                continue;
            }
            match extract_token(text) {
                Some(token) => {
                    info!(target: "fleet.core.poll", slot = name, attempt, "token found");
                    return PollOutcome::Found {
                        token: token.to_string(),
                        attempt,
                    };
                }
                None => {
                    warn!(target: "fleet.core.poll", slot = name, attempt, output = text, "could not parse token from server list");
                }
            }
        }

        PollOutcome::Exhausted {
            attempts: self.policy.max_attempts,
        }
    }
}
