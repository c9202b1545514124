//! Sighting endpoints
//!
//! Thin adapters: decode, hand the caller's actor to the lifecycle
//! controller, encode. All decisions happen in the controller.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use spotter_common::models::SightingFilter;
use spotter_common::policy::Permissions;
use spotter_common::{Sighting, SightingStatus};

use crate::api::{json_body, Caller};
use crate::error::{ApiError, ApiResult};
use crate::services::{NewSighting, SightingPatch};
use crate::AppState;

/// GET /api/sightings query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_filter(self) -> ApiResult<SightingFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<SightingStatus>()
                    .map_err(|e| ApiError::Validation(e.to_string()))?,
            ),
        };

        Ok(SightingFilter {
            status,
            owner_id: self.owner.filter(|o| !o.trim().is_empty()),
            limit: self.limit,
        })
    }
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation("Invalid sighting ID".to_string()))
}

/// Anonymous callers get 401 before the id or body is looked at
fn require_sign_in(caller: &Caller, message: &str) -> ApiResult<()> {
    if caller.actor.is_authenticated() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(message.to_string()))
    }
}

/// POST /api/sightings
pub async fn create_sighting(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewSighting>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sighting>)> {
    require_sign_in(&caller, "Sign in to submit a sighting")?;
    let fields = json_body(body)?;
    let sighting = state.lifecycle.create(&caller.actor, fields).await?;
    Ok((StatusCode::CREATED, Json(sighting)))
}

/// GET /api/sightings
pub async fn list_sightings(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Sighting>>> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let filter = params.into_filter()?;
    Ok(Json(state.lifecycle.list(&filter).await?))
}

/// GET /api/sightings/:id
pub async fn get_sighting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sighting>> {
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.get(id).await?))
}

/// PUT /api/sightings/:id
pub async fn edit_sighting(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<SightingPatch>, JsonRejection>,
) -> ApiResult<Json<Sighting>> {
    require_sign_in(&caller, "Sign in to edit sightings")?;
    let id = parse_id(&id)?;
    let patch = json_body(body)?;
    Ok(Json(state.lifecycle.edit(&caller.actor, id, patch).await?))
}

/// DELETE /api/sightings/:id
pub async fn delete_sighting(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_sign_in(&caller, "Sign in to delete sightings")?;
    let id = parse_id(&id)?;
    state.lifecycle.delete(&caller.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sightings/:id/approve
pub async fn approve_sighting(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Sighting>> {
    require_sign_in(&caller, "Sign in to approve sightings")?;
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.approve(&caller.actor, id).await?))
}

/// GET /api/sightings/:id/permissions
pub async fn sighting_permissions(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Permissions>> {
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.permissions(&caller.actor, id).await?))
}

/// Build sighting routes
pub fn sighting_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sightings", post(create_sighting).get(list_sightings))
        .route(
            "/api/sightings/:id",
            get(get_sighting).put(edit_sighting).delete(delete_sighting),
        )
        .route("/api/sightings/:id/approve", post(approve_sighting))
        .route("/api/sightings/:id/permissions", get(sighting_permissions))
}
