//! Built-in snapshot scheduler
//!
//! Optional alternative to an external cron: runs the snapshot job (and
//! optionally a cache refresh first) on a fixed interval. The first tick
//! fires immediately at startup.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::AppState;

/// Spawn the scheduler loop
///
/// A failed run is logged and recorded as the service's last error; the loop
/// keeps going.
pub fn spawn_snapshot_scheduler(
    state: AppState,
    period: Duration,
    refresh_first: bool,
) -> JoinHandle<()> {
    info!(
        "Starting snapshot scheduler (interval: {}s, refresh first: {})",
        period.as_secs(),
        refresh_first
    );

    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;

            if refresh_first {
                if let Err(e) = state.refresh_cache().await {
                    warn!("Scheduled cache refresh failed: {}", e);
                }
            }

            match state.run_snapshot(chrono::Utc::now()).await {
                Ok(outcome) => info!(
                    inserted = outcome.inserted(),
                    "Scheduled snapshot: {}",
                    outcome.message()
                ),
                Err(e) => error!("Scheduled snapshot failed: {}", e),
            }
        }
    })
}
