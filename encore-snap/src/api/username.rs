//! Username validation endpoint

use axum::{routing::post, Json, Router};
use encore_common::{validate_username, UsernameValidation};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

/// POST /api/username/validate
///
/// Always 200; the verdict is in the body.
pub async fn validate(Json(request): Json<UsernameRequest>) -> Json<UsernameValidation> {
    Json(validate_username(&request.username))
}

/// Build username routes
pub fn username_routes() -> Router<AppState> {
    Router::new().route("/api/username/validate", post(validate))
}
