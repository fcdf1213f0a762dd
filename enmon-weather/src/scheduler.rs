/**
 * REPORTING SCHEDULER - Fixed-interval report cycles
 *
 * ROLE: Every `interval`, offers each known plant exactly one report attempt.
 * Attempts run concurrently, so a slow or failing weather fetch for one plant
 * never holds up the others.
 *
 * RULES: no cycle while the broker link is down (no catch-up afterwards),
 * late ticks are delayed rather than bunched, shutdown stops the loop and
 * abandons any cycle in flight.
 */

use crate::health::LinkStatus;
use crate::provider::ReportOutcome;
use crate::registry::SharedProviderRegistry;
use futures::future::join_all;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(900);

/// Counts of outcomes in one cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub reported: usize,
    pub stale: usize,
    pub failed: usize,
}

impl CycleSummary {
    fn record(&mut self, outcome: &ReportOutcome) {
        match outcome {
            ReportOutcome::Reported(_) => self.reported += 1,
            ReportOutcome::SkippedStale => self.stale += 1,
            ReportOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.reported + self.stale + self.failed
    }
}

pub struct ReportingScheduler {
    registry: SharedProviderRegistry,
    link: LinkStatus,
    interval: Duration,
}

impl ReportingScheduler {
    pub fn new(registry: SharedProviderRegistry, link: LinkStatus, interval: Duration) -> Self {
        Self {
            registry,
            link,
            interval,
        }
    }

    /// Runs one report cycle over a snapshot of the registry.
    ///
    /// Returns `None` when the link is down and the cycle was skipped.
    pub async fn run_cycle(&self) -> Option<CycleSummary> {
        if !self.link.is_connected() {
            info!("[scheduler] broker not connected, skipping cycle");
            return None;
        }

        let providers = self.registry.snapshot();
        let outcomes = join_all(providers.iter().map(|p| self.registry.report(p))).await;

        let mut summary = CycleSummary::default();
        for outcome in &outcomes {
            summary.record(outcome);
        }

        if summary.total() > 0 {
            info!(
                "[scheduler] cycle done: {} reported, {} stale, {} failed",
                summary.reported, summary.stale, summary.failed
            );
        } else {
            debug!("[scheduler] cycle done: no plants registered");
        }
        Some(summary)
    }

    /// Ticks until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("[scheduler] reporting every {}s", self.interval.as_secs());

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.run_cycle() => {}
                        _ = shutdown.changed() => {
                            info!("[scheduler] shutdown during cycle, abandoning it");
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("[scheduler] stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
