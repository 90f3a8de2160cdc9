//! Job trigger endpoints
//!
//! Called by the external scheduler (or an operator). No request body.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::services::SnapshotOutcome;
use crate::{ApiResult, AppState};

/// GET|POST /api/jobs/weekly-snapshot
///
/// - `200 {"message"}` when there is nothing to do
/// - `200 {"success": true, "message"}` when snapshots were created
/// - `500 {"error"}` when any database step failed
pub async fn run_weekly_snapshot(State(state): State<AppState>) -> Response {
    match state.run_snapshot(chrono::Utc::now()).await {
        Ok(outcome @ SnapshotOutcome::Created { .. }) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": outcome.message() })),
        )
            .into_response(),
        Ok(outcome) => (StatusCode::OK, Json(json!({ "message": outcome.message() }))).into_response(),
        Err(e) => {
            tracing::error!("Weekly snapshot failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Cache refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub refreshed: u64,
}

/// POST /api/jobs/refresh-artists
pub async fn refresh_artists(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let refreshed = state.refresh_cache().await?;
    Ok(Json(RefreshResponse {
        success: true,
        refreshed,
    }))
}

/// Build job trigger routes
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/jobs/weekly-snapshot",
            get(run_weekly_snapshot).post(run_weekly_snapshot),
        )
        .route("/api/jobs/refresh-artists", post(refresh_artists))
}
