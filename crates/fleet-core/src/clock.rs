use std::time::Duration;

use async_trait::async_trait;

/// Blocking pause used between engine calls; swapped out in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, dur: Duration);
}

/// Wall-clock sleep on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}
