// Periodic refresh driver
// Author: kelexine (https://github.com/kelexine)

use crate::coordinator::{Coordinator, RefreshOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Calls [`Coordinator::on_scheduled_tick`] on a fixed period.
pub struct Scheduler {
    coordinator: Arc<Coordinator>,
    period: Duration,
}

impl Scheduler {
    pub fn new(coordinator: Arc<Coordinator>, period: Duration) -> Self {
        Self {
            coordinator,
            period,
        }
    }

    /// Run until `cancel` fires. The first tick happens immediately.
    ///
    /// Returns the number of completed ticks.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut tick = tokio::time::interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0u64;

        info!("Scheduler started, refreshing every {:?}", self.period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scheduler stopped after {} ticks", ticks);
                    return ticks;
                }
                _ = tick.tick() => {
                    ticks += 1;
                    match self.coordinator.on_scheduled_tick().await {
                        Ok(RefreshOutcome::Updated { snapshot, notifications }) => info!(
                            "Scheduled refresh: {} citations, {} notifications",
                            snapshot.citations,
                            notifications.len()
                        ),
                        Ok(outcome) => debug!("Scheduled refresh: {:?}", outcome),
                        Err(e) => warn!("Scheduled refresh failed: {}", e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, ScholarConfig};
    use crate::error::{CiteError, Result};
    use crate::notify::Sinks;
    use crate::storage::MemoryStore;
    use crate::transport::PageSource;
    use futures::future::{BoxFuture, FutureExt};

    struct Unreachable;

    impl PageSource for Unreachable {
        fn fetch_page<'a>(
            &'a self,
            _url: &'a str,
            _cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<String>> {
            async { Err(CiteError::Internal("no profile is configured".to_string())) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_cancelled() {
        let coordinator = Arc::new(Coordinator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Unreachable),
            Sinks::tracing(),
            ScholarConfig::default(),
            &CacheConfig::default(),
        ));
        let scheduler = Scheduler::new(coordinator, Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(150)).await;
            stopper.cancel();
        });

        // Immediate tick plus ticks at 60s and 120s.
        assert_eq!(scheduler.run(cancel).await, 3);
    }
}
