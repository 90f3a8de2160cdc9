//! encore-snap library - weekly artist snapshot service
//!
//! Hosts the snapshot job, the artist cache refresh and the read endpoints
//! over snapshots behind an axum router.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::services::{MetricsProvider, RefreshError, SnapshotOutcome};

const SNAPSHOT_JOB: &str = "snapshot";
const REFRESH_JOB: &str = "cache refresh";

/// Application state shared across HTTP handlers and the scheduler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Source of artist metrics (Spotify in production)
    pub metrics: Arc<dyn MetricsProvider>,
    /// Serializes snapshot runs started inside this process
    pub snapshot_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last job error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, metrics: Arc<dyn MetricsProvider>) -> Self {
        Self {
            db,
            metrics,
            snapshot_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Run the snapshot job, one run at a time per process
    pub async fn run_snapshot(&self, now: DateTime<Utc>) -> encore_common::Result<SnapshotOutcome> {
        let _guard = self.snapshot_lock.lock().await;
        let result = services::run_weekly_snapshot(&self.db, now).await;
        match &result {
            Ok(_) => self.clear_error(SNAPSHOT_JOB).await,
            Err(e) => self.record_error(SNAPSHOT_JOB, e).await,
        }
        result
    }

    /// Refresh the artist cache from the metrics provider
    pub async fn refresh_cache(&self) -> Result<u64, RefreshError> {
        let result = services::refresh_artist_cache(&self.db, self.metrics.as_ref()).await;
        match &result {
            Ok(_) => self.clear_error(REFRESH_JOB).await,
            Err(e) => self.record_error(REFRESH_JOB, e).await,
        }
        result
    }

    async fn record_error(&self, job: &str, error: &(dyn std::fmt::Display + Sync)) {
        *self.last_error.write().await = Some(format!("{}: {}", job, error));
    }

    /// Forget the last error if it came from `job`
    ///
    /// A success of one job leaves the other job's failure visible.
    async fn clear_error(&self, job: &str) {
        let mut last_error = self.last_error.write().await;
        let from_job = last_error
            .as_deref()
            .map_or(false, |message| message.starts_with(&format!("{}:", job)));
        if from_job {
            *last_error = None;
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::job_routes())
        .merge(api::snapshot_routes())
        .merge(api::artist_routes())
        .merge(api::username_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
