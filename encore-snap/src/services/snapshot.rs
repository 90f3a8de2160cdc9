//! Weekly snapshot job
//!
//! For the active season, compute the current week and record one
//! popularity/follower snapshot per cached artist not yet snapshotted that
//! week. Stateless between runs: everything is re-read from the database.

use chrono::{DateTime, Utc};
use encore_common::db::WeeklySnapshot;
use encore_common::time::week_number;
use encore_common::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::db::{artists, seasons, snapshots};

/// What a snapshot run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// No season is flagged active; nothing to do
    NoActiveSeason,
    /// Every cached artist already has a snapshot for this week
    UpToDate { week_number: i64 },
    /// New snapshots were written
    Created { week_number: i64, inserted: u64 },
}

impl SnapshotOutcome {
    /// Rows written by the run
    pub fn inserted(&self) -> u64 {
        match self {
            SnapshotOutcome::Created { inserted, .. } => *inserted,
            _ => 0,
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> String {
        match self {
            SnapshotOutcome::NoActiveSeason => "No active season".to_string(),
            SnapshotOutcome::UpToDate { week_number } => {
                format!("No new snapshots needed for week {}", week_number)
            }
            SnapshotOutcome::Created {
                week_number,
                inserted,
            } => format!("Created {} snapshots for week {}", inserted, week_number),
        }
    }
}

/// Run the snapshot job as of `now`
///
/// Any database failure aborts the run and is returned as-is; there is no
/// retry and no row-by-row fallback.
pub async fn run_weekly_snapshot(pool: &SqlitePool, now: DateTime<Utc>) -> Result<SnapshotOutcome> {
    let run_id = Uuid::new_v4();
    async move {
        let Some(season) = seasons::load_active_season(pool).await? else {
            info!("No active season; skipping snapshot");
            return Ok(SnapshotOutcome::NoActiveSeason);
        };

        let week_number = week_number(season.start()?, now);
        debug!(season_id = season.id, week_number, "Resolved season week");

        let cached = artists::load_tracked_artists(pool).await?;
        let existing = snapshots::snapshotted_artist_ids(pool, week_number).await?;

        let pending: Vec<WeeklySnapshot> = cached
            .iter()
            .filter(|artist| !existing.contains(&artist.spotify_id))
            .map(|artist| WeeklySnapshot::from_artist(week_number, artist))
            .collect();

        if pending.is_empty() {
            info!(
                week_number,
                cached = cached.len(),
                "All cached artists already snapshotted"
            );
            return Ok(SnapshotOutcome::UpToDate { week_number });
        }

        let inserted = snapshots::insert_snapshots(pool, &pending).await?;
        info!(
            week_number,
            inserted,
            skipped = existing.len(),
            "Weekly snapshot complete"
        );

        // A concurrent writer may have filled every gap between our read and write
        if inserted == 0 {
            return Ok(SnapshotOutcome::UpToDate { week_number });
        }

        Ok(SnapshotOutcome::Created {
            week_number,
            inserted,
        })
    }
    .instrument(info_span!("weekly_snapshot", %run_id))
    .await
}
