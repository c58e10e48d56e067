//! Periodic health-probe scheduler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use mcpd_core::HealthStatus;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, timeout};
use tokio_util::sync::CancellationToken;

use crate::client::ClientError;
use crate::health::HealthTracker;
use crate::registry::ClientRegistry;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Cadence between rounds.
    pub interval: Duration,
    /// Ceiling on one ping within a round.
    pub ping_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
        }
    }
}

/// Pings every registered server on a fixed cadence and feeds the tracker.
///
/// The first round fires immediately on startup. Cancellation between or
/// during rounds makes `run` return promptly, even when a child's ping
/// ignores its deadline (the probe task is simply left behind).
pub struct HealthScheduler {
    registry: Arc<ClientRegistry>,
    tracker: Arc<HealthTracker>,
    options: SchedulerOptions,
}

impl HealthScheduler {
    pub fn new(
        registry: Arc<ClientRegistry>,
        tracker: Arc<HealthTracker>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            registry,
            tracker,
            options,
        }
    }

    /// Drive rounds until `cancel` fires. Always returns an error naming
    /// the cancellation so callers can distinguish it from a clean path.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("health scheduler stopping");
                    bail!("health scheduler cancelled");
                }
                _ = ticker.tick() => {
                    self.round(&cancel).await?;
                }
            }
        }
    }

    /// One fan-out round over every currently registered server.
    async fn round(&self, cancel: &CancellationToken) -> Result<()> {
        let mut probes = JoinSet::new();
        for name in self.registry.list() {
            let Some(client) = self.registry.client(&name) else {
                continue;
            };
            let tracker = self.tracker.clone();
            let ping_timeout = self.options.ping_timeout;
            probes.spawn(async move {
                let started = Instant::now();
                let (status, latency) = match timeout(ping_timeout, client.ping()).await {
                    Ok(Ok(())) => (HealthStatus::Ok, Some(started.elapsed())),
                    Ok(Err(ClientError::Timeout | ClientError::Cancelled)) => {
                        (HealthStatus::Timeout, None)
                    }
                    Ok(Err(_)) => (HealthStatus::Unreachable, None),
                    Err(_) => (HealthStatus::Timeout, None),
                };
                if let Err(error) = tracker.update(&name, status, latency) {
                    tracing::debug!(server = %name, error = %error, "health update skipped");
                }
            });
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Outstanding probes are abandoned; a child blocked in
                    // read cannot hold the scheduler hostage.
                    tracing::warn!("health check round interrupted");
                    bail!("health check round interrupted");
                }
                joined = probes.join_next() => {
                    if joined.is_none() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HealthScheduler, SchedulerOptions};
    use crate::health::HealthTracker;
    use crate::registry::ClientRegistry;
    use crate::testing::{MockClient, PingBehavior};
    use mcpd_core::HealthStatus;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn scheduler(
        registry: &Arc<ClientRegistry>,
        tracker: &Arc<HealthTracker>,
    ) -> HealthScheduler {
        HealthScheduler::new(
            registry.clone(),
            tracker.clone(),
            SchedulerOptions {
                interval: Duration::from_secs(10),
                ping_timeout: Duration::from_secs(3),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_round_runs_immediately() {
        let registry = Arc::new(ClientRegistry::new());
        let tracker = Arc::new(HealthTracker::new());
        registry.add("up", MockClient::healthy(), &[]);
        tracker.add("up");

        let scheduler = scheduler(&registry, &tracker);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(async move { scheduler.run(cancel).await });

        // Well inside the first interval: the bootstrap round already ran.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(tracker.status("up").unwrap().status, HealthStatus::Ok);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_map_to_statuses() {
        let registry = Arc::new(ClientRegistry::new());
        let tracker = Arc::new(HealthTracker::new());

        registry.add(
            "up",
            MockClient::with_ping(PingBehavior::Ok(Duration::from_millis(50))),
            &[],
        );
        registry.add("down", MockClient::with_ping(PingBehavior::Unreachable), &[]);
        registry.add("wedged", MockClient::with_ping(PingBehavior::Stuck), &[]);
        for name in ["up", "down", "wedged"] {
            tracker.add(name);
        }

        let scheduler = scheduler(&registry, &tracker);
        let cancel = CancellationToken::new();
        scheduler.round(&cancel).await.unwrap();

        let up = tracker.status("up").unwrap();
        assert_eq!(up.status, HealthStatus::Ok);
        assert!(up.latency.unwrap() >= Duration::from_millis(50));
        assert!(up.last_successful.is_some());

        let down = tracker.status("down").unwrap();
        assert_eq!(down.status, HealthStatus::Unreachable);
        assert!(down.last_successful.is_none());

        let wedged = tracker.status("wedged").unwrap();
        assert_eq!(wedged.status, HealthStatus::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_round_with_a_stuck_ping() {
        let registry = Arc::new(ClientRegistry::new());
        let tracker = Arc::new(HealthTracker::new());
        registry.add("wedged", MockClient::with_ping(PingBehavior::Stuck), &[]);
        tracker.add("wedged");

        // A ping timeout far beyond the cancellation point, so only the
        // token can end the round.
        let scheduler = HealthScheduler::new(
            registry.clone(),
            tracker.clone(),
            SchedulerOptions {
                interval: Duration::from_secs(10),
                ping_timeout: Duration::from_secs(3600),
            },
        );

        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let task = tokio::spawn(async move { scheduler.run(run_cancel).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler must return promptly after cancellation")
            .expect("scheduler task must not panic");
        let error = result.unwrap_err();
        assert!(
            error.to_string().contains("interrupted") || error.to_string().contains("cancelled"),
            "expected a cancellation error, got: {error}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn later_rounds_follow_the_interval() {
        let registry = Arc::new(ClientRegistry::new());
        let tracker = Arc::new(HealthTracker::new());
        registry.add("up", MockClient::healthy(), &[]);
        tracker.add("up");

        let scheduler = scheduler(&registry, &tracker);
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let task = tokio::spawn(async move { scheduler.run(run_cancel).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        let first_check = tracker.status("up").unwrap().last_checked.unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        let second_check = tracker.status("up").unwrap().last_checked.unwrap();
        assert!(second_check > first_check);

        cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
    }
}
