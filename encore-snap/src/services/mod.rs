//! Jobs and external clients for encore-snap

pub mod cache_refresh;
pub mod deltas;
pub mod scheduler;
pub mod snapshot;
pub mod spotify_client;

pub use cache_refresh::{refresh_artist_cache, track_artists, RefreshError};
pub use deltas::{compute_deltas, snapshot_deltas, SnapshotDelta};
pub use scheduler::spawn_snapshot_scheduler;
pub use snapshot::{run_weekly_snapshot, SnapshotOutcome};
pub use spotify_client::{MetricsProvider, SpotifyClient, SpotifyError};
