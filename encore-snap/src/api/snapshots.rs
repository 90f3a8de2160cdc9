//! Snapshot read endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use encore_common::db::WeeklySnapshot;
use serde::Serialize;

use crate::db::snapshots;
use crate::services::{snapshot_deltas, SnapshotDelta};
use crate::{ApiError, ApiResult, AppState};

/// Snapshots recorded for one week
#[derive(Debug, Serialize)]
pub struct WeekSnapshotsResponse {
    pub week_number: i64,
    pub count: usize,
    pub snapshots: Vec<WeeklySnapshot>,
}

/// Deltas for one week
#[derive(Debug, Serialize)]
pub struct WeekDeltasResponse {
    pub week_number: i64,
    pub deltas: Vec<SnapshotDelta>,
}

fn check_week(week_number: i64) -> ApiResult<()> {
    if week_number < 1 {
        return Err(ApiError::BadRequest(format!(
            "Week number must be at least 1 (got {})",
            week_number
        )));
    }
    Ok(())
}

/// GET /api/snapshots/:week
pub async fn get_week_snapshots(
    State(state): State<AppState>,
    Path(week_number): Path<i64>,
) -> ApiResult<Json<WeekSnapshotsResponse>> {
    check_week(week_number)?;
    let rows = snapshots::load_week(&state.db, week_number).await?;

    Ok(Json(WeekSnapshotsResponse {
        week_number,
        count: rows.len(),
        snapshots: rows,
    }))
}

/// GET /api/snapshots/:week/deltas
pub async fn get_week_deltas(
    State(state): State<AppState>,
    Path(week_number): Path<i64>,
) -> ApiResult<Json<WeekDeltasResponse>> {
    check_week(week_number)?;
    let deltas = snapshot_deltas(&state.db, week_number).await?;

    Ok(Json(WeekDeltasResponse {
        week_number,
        deltas,
    }))
}

/// Build snapshot read routes
pub fn snapshot_routes() -> Router<AppState> {
    Router::new()
        .route("/api/snapshots/:week", get(get_week_snapshots))
        .route("/api/snapshots/:week/deltas", get(get_week_deltas))
}
