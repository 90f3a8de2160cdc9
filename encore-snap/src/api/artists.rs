//! Artist tracking endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::track_artists;
use crate::{ApiResult, AppState};

/// Request body for POST /api/artists/track
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,
    pub tracked: u64,
}

/// POST /api/artists/track
///
/// Fetches the given artists from the metrics provider and adds them to the
/// cache so the next snapshot includes them.
pub async fn track(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> ApiResult<Json<TrackResponse>> {
    let tracked = track_artists(&state.db, state.metrics.as_ref(), &request.ids).await?;
    Ok(Json(TrackResponse {
        success: true,
        tracked,
    }))
}

/// Build artist routes
pub fn artist_routes() -> Router<AppState> {
    Router::new().route("/api/artists/track", post(track))
}
