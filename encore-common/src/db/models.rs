//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Scoring season
///
/// `start_date` is kept as stored; use [`Season::start`] for the parsed instant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Season {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
}

impl Season {
    /// Parsed season start
    pub fn start(&self) -> Result<DateTime<Utc>> {
        crate::time::parse_season_start(&self.start_date)
    }
}

/// Artist cache row: latest known provider metrics for a tracked artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackedArtist {
    pub spotify_id: String,
    pub current_popularity: i64,
    pub current_followers: i64,
}

/// Immutable per-artist metrics record for one season week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeeklySnapshot {
    pub week_number: i64,
    pub artist_id: String,
    pub popularity: i64,
    pub followers: i64,
}

impl WeeklySnapshot {
    /// Snapshot of `artist` for `week_number`, metrics copied verbatim
    pub fn from_artist(week_number: i64, artist: &TrackedArtist) -> Self {
        Self {
            week_number,
            artist_id: artist.spotify_id.clone(),
            popularity: artist.current_popularity,
            followers: artist.current_followers,
        }
    }
}

/// Fresh metrics for one artist as returned by the metrics provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistMetrics {
    pub spotify_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub popularity: i64,
    pub followers: i64,
}
