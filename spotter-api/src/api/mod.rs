//! HTTP API handlers for spotter-api

pub mod actors;
pub mod auth;
pub mod health;
pub mod identify;
pub mod sightings;
pub mod species;

pub use actors::actor_routes;
pub use auth::Caller;
pub use health::health_routes;
pub use identify::identify_routes;
pub use sightings::sighting_routes;
pub use species::species_routes;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, reporting decode failures as validation errors
///
/// Bodies over the router limit keep their 413 so clients know to send a
/// smaller photo.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::Validation(rejection.body_text())
        }
    })
}
