//! Caller profile

use axum::{routing::get, Json, Router};
use serde::Serialize;

use spotter_common::Role;

use crate::api::Caller;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// GET /api/actors/me
pub async fn current_actor(caller: Caller) -> ApiResult<Json<ProfileResponse>> {
    let record = caller
        .record
        .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;

    Ok(Json(ProfileResponse {
        display_name: record.display_label(),
        id: record.id,
        email: record.email,
        role: record.role,
    }))
}

/// Build actor routes
pub fn actor_routes() -> Router<AppState> {
    Router::new().route("/api/actors/me", get(current_actor))
}
