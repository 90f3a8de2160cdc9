//! Artist cache refresh
//!
//! Pulls current metrics from the provider and upserts them into
//! `artists_cache`. Also how a newly picked artist enters the cache.

use encore_common::Error;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use thiserror::Error as ThisError;
use tracing::{info, warn};

use super::spotify_client::{MetricsProvider, SpotifyError};
use crate::db::artists;

/// Maximum ids accepted by a single track request
pub const MAX_TRACK_IDS: usize = 200;

/// Cache refresh errors
#[derive(Debug, ThisError)]
pub enum RefreshError {
    #[error(transparent)]
    Provider(#[from] SpotifyError),

    #[error(transparent)]
    Store(#[from] Error),
}

/// Spotify ids are 22 base-62 characters
pub fn is_valid_spotify_id(id: &str) -> bool {
    id.len() == 22 && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Refresh every cached artist from the provider
///
/// Artists the provider no longer returns keep their previous metrics.
/// Returns the number of cache rows refreshed.
pub async fn refresh_artist_cache(
    pool: &SqlitePool,
    provider: &dyn MetricsProvider,
) -> Result<u64, RefreshError> {
    let ids = artists::list_tracked_ids(pool).await?;
    if ids.is_empty() {
        info!("Artist cache is empty; nothing to refresh");
        return Ok(0);
    }

    let metrics = provider.fetch_artists(&ids).await?;
    if metrics.len() < ids.len() {
        warn!(
            requested = ids.len(),
            returned = metrics.len(),
            "Provider did not return every cached artist"
        );
    }

    let refreshed = artists::upsert_artist_metrics(pool, &metrics).await?;
    info!(refreshed, "Artist cache refreshed");
    Ok(refreshed)
}

/// Start tracking `ids`: fetch their metrics and add them to the cache
///
/// Ids are de-duplicated. Returns the number of artists written.
pub async fn track_artists(
    pool: &SqlitePool,
    provider: &dyn MetricsProvider,
    ids: &[String],
) -> Result<u64, RefreshError> {
    let unique: BTreeSet<&str> = ids.iter().map(|id| id.trim()).collect();

    if unique.is_empty() {
        return Err(Error::InvalidInput("No artist ids supplied".to_string()).into());
    }
    if unique.len() > MAX_TRACK_IDS {
        return Err(Error::InvalidInput(format!(
            "Too many artist ids ({}, max {})",
            unique.len(),
            MAX_TRACK_IDS
        ))
        .into());
    }
    if let Some(bad) = unique.iter().find(|id| !is_valid_spotify_id(id)) {
        return Err(Error::InvalidInput(format!("Invalid Spotify artist id: {:?}", bad)).into());
    }

    let unique: Vec<String> = unique.into_iter().map(str::to_string).collect();
    let metrics = provider.fetch_artists(&unique).await?;
    let tracked = artists::upsert_artist_metrics(pool, &metrics).await?;

    info!(requested = unique.len(), tracked, "Tracked artists");
    Ok(tracked)
}
