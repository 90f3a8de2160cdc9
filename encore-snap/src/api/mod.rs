//! HTTP API handlers for encore-snap

pub mod artists;
pub mod health;
pub mod jobs;
pub mod snapshots;
pub mod username;

pub use artists::artist_routes;
pub use health::health_routes;
pub use jobs::job_routes;
pub use snapshots::snapshot_routes;
pub use username::username_routes;
