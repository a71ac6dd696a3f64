//! Periodic broadcast driver.
//!
//! [`run_broadcast_loop`] fires [`Broadcaster::run_cycle`] on a fixed
//! period until the shutdown future resolves. Missed periods are skipped,
//! not bunched, so a slow cycle never triggers a burst of catch-up cycles.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::broadcaster::Broadcaster;

/// Result of a broadcast loop run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Cycles that ran to completion.
    pub cycles: u64,
    /// Cycles that took longer than the period.
    pub overruns: u64,
    /// Cycles skipped because the previous one was still running.
    pub skipped: u64,
}

/// Drive broadcast cycles every `period` until `shutdown` completes.
///
/// The first cycle fires one full period after the call, so the first
/// `update` a subscriber sees carries tick 1.
pub async fn run_broadcast_loop<F>(
    broadcaster: &Broadcaster,
    period: Duration,
    shutdown: F,
) -> LoopSummary
where
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;
    tokio::pin!(shutdown);

    let mut summary = LoopSummary::default();
    info!(period_ms = period.as_millis(), "Broadcast loop starting");

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = interval.tick() => {
                // --- Run cycle ---
                let Some(report) = broadcaster.run_cycle() else {
                    summary.skipped = summary.skipped.saturating_add(1);
                    continue;
                };
                summary.cycles = summary.cycles.saturating_add(1);

                // --- Check overrun ---
                if report.elapsed > period {
                    summary.overruns = summary.overruns.saturating_add(1);
                    warn!(
                        tick = report.tick,
                        elapsed_ms = report.elapsed.as_millis(),
                        period_ms = period.as_millis(),
                        subscribers = report.visited,
                        "Broadcast cycle overran its period"
                    );
                }
            }
        }
    }

    info!(
        cycles = summary.cycles,
        overruns = summary.overruns,
        final_tick = broadcaster.current_tick(),
        "Broadcast loop stopped"
    );
    summary
}
