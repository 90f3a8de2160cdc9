//! Week-over-week snapshot deltas
//!
//! The game scores artists on how their popularity and follower counts move
//! between consecutive weekly snapshots.

use encore_common::db::WeeklySnapshot;
use encore_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::snapshots;

/// Change in one artist's metrics from the previous week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDelta {
    pub artist_id: String,
    pub week_number: i64,
    pub popularity: i64,
    pub followers: i64,
    pub previous_popularity: Option<i64>,
    pub previous_followers: Option<i64>,
    pub popularity_delta: i64,
    pub followers_delta: i64,
}

/// Pair each current snapshot with the same artist's previous one
///
/// Artists with no previous snapshot get zero deltas. Sorted by
/// `popularity_delta` descending, then `artist_id`.
pub fn compute_deltas(
    current: &[WeeklySnapshot],
    previous: &[WeeklySnapshot],
) -> Vec<SnapshotDelta> {
    let previous_by_artist: HashMap<&str, &WeeklySnapshot> = previous
        .iter()
        .map(|s| (s.artist_id.as_str(), s))
        .collect();

    let mut deltas: Vec<SnapshotDelta> = current
        .iter()
        .map(|snap| {
            let prev = previous_by_artist.get(snap.artist_id.as_str());
            SnapshotDelta {
                artist_id: snap.artist_id.clone(),
                week_number: snap.week_number,
                popularity: snap.popularity,
                followers: snap.followers,
                previous_popularity: prev.map(|p| p.popularity),
                previous_followers: prev.map(|p| p.followers),
                popularity_delta: prev.map_or(0, |p| snap.popularity - p.popularity),
                followers_delta: prev.map_or(0, |p| snap.followers - p.followers),
            }
        })
        .collect();

    deltas.sort_by(|a, b| {
        b.popularity_delta
            .cmp(&a.popularity_delta)
            .then_with(|| a.artist_id.cmp(&b.artist_id))
    });
    deltas
}

/// Deltas for every artist snapshotted in `week_number`
pub async fn snapshot_deltas(pool: &SqlitePool, week_number: i64) -> Result<Vec<SnapshotDelta>> {
    if week_number < 1 {
        return Err(Error::InvalidInput(format!(
            "Week number must be at least 1 (got {})",
            week_number
        )));
    }

    let current = snapshots::load_week(pool, week_number).await?;
    let previous = if week_number > 1 {
        snapshots::load_week(pool, week_number - 1).await?
    } else {
        Vec::new()
    };

    Ok(compute_deltas(&current, &previous))
}
